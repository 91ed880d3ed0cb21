use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldmeasure_core::geojson::measures_to_collection;
use fieldmeasure_core::units::{format_acres, measure_summary};
use fieldmeasure_core::{
    GeoPoint, LayerGroupPresenter, Measure, MeasureId, MeasureStore, Measurements, SceneWidget,
    ShapeDraft, ShapeKind, SurveyConfig, SurveySession,
};
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fieldmeasure")]
#[command(about = "Measure field areas, distances and points of interest")]
pub struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory holding saved measures.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct ShapeArgs {
    /// AREA, DISTANCE or POI.
    #[arg(long, value_parser = parse_kind)]
    kind: ShapeKind,
    /// Vertex as `lat,lng` in degrees; repeat in drawing order.
    #[arg(
        long = "point",
        value_name = "LAT,LNG",
        value_parser = parse_point,
        allow_hyphen_values = true
    )]
    points: Vec<GeoPoint>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute measurements and edge labels for a shape without saving it.
    Measure {
        #[command(flatten)]
        shape: ShapeArgs,
        /// Print the rendered overlay as GeoJSON instead.
        #[arg(long)]
        geojson: bool,
    },
    /// Save a shape as a new measure.
    Save {
        #[command(flatten)]
        shape: ShapeArgs,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        group: String,
    },
    /// List saved measures, most recent first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Count saved measures per group.
    Groups,
    /// Print one saved measure with freshly computed measurements.
    Show { id: MeasureId },
    /// Delete a saved measure.
    Delete { id: MeasureId },
    /// Export saved measures as share JSON, or GeoJSON with `--geojson`.
    Export {
        #[arg(long)]
        id: Option<MeasureId>,
        #[arg(long)]
        geojson: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeasureOutput {
    kind: ShapeKind,
    points: Vec<GeoPoint>,
    complete: bool,
    #[serde(flatten)]
    measurements: Measurements,
    edges: Vec<EdgeOutput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeOutput {
    index: usize,
    length_meters: f64,
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowOutput<'a> {
    #[serde(flatten)]
    measure: &'a Measure,
    recomputed: Measurements,
    summary: String,
    acres: Option<String>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Measure { shape, geojson } => run_measure(&shape, geojson),
        Commands::Save { shape, name, description, group } => {
            run_save(load_store(cli.config, cli.data_dir)?, &shape, &name, &description, &group)
        }
        Commands::List { json } => run_list(&load_store(cli.config, cli.data_dir)?, json),
        Commands::Groups => run_groups(&load_store(cli.config, cli.data_dir)?),
        Commands::Show { id } => run_show(&load_store(cli.config, cli.data_dir)?, id),
        Commands::Delete { id } => run_delete(load_store(cli.config, cli.data_dir)?, id),
        Commands::Export { id, geojson } => {
            run_export(&load_store(cli.config, cli.data_dir)?, id, geojson)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(file: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<SurveyConfig> {
    let config = match &file {
        Some(path) => SurveyConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SurveyConfig::default(),
    };
    let config = config.merge_env().context("invalid environment configuration")?;

    Ok(match data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn load_store(file: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<MeasureStore> {
    Ok(load_config(file, data_dir)?.open_store())
}

/// Replay the shape through a drawing session, as if clicked on a map
fn draw(store: MeasureStore, shape: &ShapeArgs) -> SurveySession<LayerGroupPresenter<SceneWidget>> {
    let mut session = SurveySession::new(store, LayerGroupPresenter::new(SceneWidget::new()));
    session.start(shape.kind);
    for point in &shape.points {
        session.click(*point);
    }
    session
}

fn run_measure(shape: &ShapeArgs, geojson: bool) -> Result<()> {
    let session = draw(MeasureStore::in_memory(), shape);

    if geojson {
        print_json(&session.presenter().widget().to_geojson())?;
        return Ok(());
    }

    let draft = session.draft().context("no shape was drawn")?;
    let edges = draft
        .edge_labels()
        .into_iter()
        .map(|label| EdgeOutput {
            index: label.index,
            length_meters: label.length_meters,
            text: label.text,
        })
        .collect();

    print_json(&MeasureOutput {
        kind: draft.kind(),
        points: draft.points().to_vec(),
        complete: draft.is_complete(),
        measurements: draft.measurements(),
        edges,
    })
}

fn run_save(
    store: MeasureStore,
    shape: &ShapeArgs,
    name: &str,
    description: &str,
    group: &str,
) -> Result<()> {
    let mut session = draw(store, shape);
    let measure =
        session.finish_save(name, description, group).context("failed to save measure")?;
    print_json(&measure)?;
    session.store().flush_activity();
    Ok(())
}

fn run_list(store: &MeasureStore, json: bool) -> Result<()> {
    if json {
        return print_json(&store.list());
    }

    if store.is_empty() {
        println!("no measures saved");
        return Ok(());
    }

    for measure in store.list() {
        println!(
            "{}  {:<8}  {}  [{}]  {}",
            measure.id,
            measure.kind.as_str(),
            measure.name,
            measure.group_label(),
            measure_summary(measure)
        );
    }
    Ok(())
}

fn run_groups(store: &MeasureStore) -> Result<()> {
    for (group, count) in store.group_summary() {
        println!("{group}: {count}");
    }
    Ok(())
}

fn run_show(store: &MeasureStore, id: MeasureId) -> Result<()> {
    let measure = store.get(id).with_context(|| format!("no measure with id {id}"))?;
    let recomputed = ShapeDraft::from_measure(measure).measurements();

    print_json(&ShowOutput {
        measure,
        recomputed,
        summary: measure_summary(measure),
        acres: recomputed.area_sq_meters.map(format_acres),
    })
}

fn run_delete(mut store: MeasureStore, id: MeasureId) -> Result<()> {
    if store.delete(id).context("failed to delete measure")? {
        println!("deleted {id}");
    } else {
        println!("no measure with id {id}");
    }
    Ok(())
}

fn run_export(store: &MeasureStore, id: Option<MeasureId>, geojson: bool) -> Result<()> {
    let measures: Vec<Measure> = match id {
        Some(id) => {
            vec![store.get(id).cloned().with_context(|| format!("no measure with id {id}"))?]
        }
        None => store.list().to_vec(),
    };

    if geojson {
        return print_json(&measures_to_collection(&measures));
    }

    let payloads: Vec<_> = measures
        .iter()
        .map(|measure| {
            ShapeDraft::from_measure(measure).share_payload(
                &measure.name,
                &measure.description,
                &measure.group,
            )
        })
        .collect();

    match (id, payloads.as_slice()) {
        (Some(_), [payload]) => print_json(payload),
        _ => print_json(&payloads),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn parse_kind(value: &str) -> Result<ShapeKind, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn parse_point(value: &str) -> Result<GeoPoint, String> {
    let (lat, lng) =
        value.split_once(',').ok_or_else(|| format!("expected LAT,LNG but got '{value}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("invalid longitude '{lng}'"))?;
    GeoPoint::try_new(lat, lng).map_err(|e| e.to_string())
}
