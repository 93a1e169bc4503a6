//! Annotate command implementation for the ecoroute CLI.
//!
//! Fetches every matching point of interest inside the bounds of a stored
//! network in one query, counts those near each edge and stores the
//! annotated network back under the same area.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ecoroute_core::geodesy::METRES_PER_DEGREE;
use ecoroute_core::{PoiProvider, PoiQueryConfig, annotate_poi_counts};
use ecoroute_data::{FileGraphStore, OverpassPoiProvider};
use geo::{Coord, Rect};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AREA, ARG_BUFFER_M, ARG_GRAPH_DIR, ARG_POI_KEY, ARG_POI_VALUE, CliError, DEFAULT_AREA,
    DEFAULT_GRAPH_DIR, write_json,
};

/// CLI arguments for the `annotate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "annotate",
    long_about = "Query points of interest covering a stored road network, \
                 record how many lie within the buffer of each edge and save \
                 the result. Running it again replaces earlier counts.",
    about = "Annotate a stored network with nearby points of interest"
)]
#[ortho_config(prefix = "ECOROUTE")]
pub(crate) struct AnnotateArgs {
    /// Name of the stored road network.
    #[arg(long = ARG_AREA, value_name = "name")]
    #[serde(default)]
    pub(crate) area: Option<String>,
    /// Directory of the graph store.
    #[arg(long = ARG_GRAPH_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) graph_dir: Option<Utf8PathBuf>,
    /// Maximum distance between an edge and a point of interest, in metres.
    #[arg(long = ARG_BUFFER_M, value_name = "metres")]
    #[serde(default)]
    pub(crate) buffer_m: Option<f64>,
    /// Tag key selecting points of interest.
    #[arg(long = ARG_POI_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) poi_key: Option<String>,
    /// Tag value selecting points of interest.
    #[arg(long = ARG_POI_VALUE, value_name = "value")]
    #[serde(default)]
    pub(crate) poi_value: Option<String>,
}

impl AnnotateArgs {
    pub(crate) fn into_config(self) -> Result<AnnotateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(AnnotateConfig::from(merged))
    }
}

/// Resolved `annotate` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnnotateConfig {
    pub(crate) area: String,
    pub(crate) graph_dir: Utf8PathBuf,
    pub(crate) query: PoiQueryConfig,
}

impl From<AnnotateArgs> for AnnotateConfig {
    fn from(args: AnnotateArgs) -> Self {
        let defaults = PoiQueryConfig::default();
        Self {
            area: args.area.unwrap_or_else(|| DEFAULT_AREA.to_owned()),
            graph_dir: args
                .graph_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_GRAPH_DIR)),
            query: PoiQueryConfig {
                key: args.poi_key.unwrap_or(defaults.key),
                value: args.poi_value.unwrap_or(defaults.value),
                buffer_m: args.buffer_m.unwrap_or(defaults.buffer_m),
            },
        }
    }
}

/// Builds the POI source used by an annotate invocation.
pub(crate) trait PoiProviderBuilder {
    fn build(&self, config: &AnnotateConfig) -> Result<Box<dyn PoiProvider>, CliError>;
}

pub(crate) struct DefaultPoiProviderBuilder;

impl PoiProviderBuilder for DefaultPoiProviderBuilder {
    fn build(&self, _config: &AnnotateConfig) -> Result<Box<dyn PoiProvider>, CliError> {
        let provider = OverpassPoiProvider::new().map_err(|source| CliError::BuildProvider {
            service: "Overpass",
            source,
        })?;
        Ok(Box::new(provider))
    }
}

/// Summary printed after annotating a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AnnotateSummary {
    pub(crate) area: String,
    pub(crate) path: Utf8PathBuf,
    pub(crate) pois: usize,
    pub(crate) edges: usize,
    pub(crate) annotated_edges: usize,
}

pub(crate) fn run_annotate(args: AnnotateArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_annotate_with(args, &DefaultPoiProviderBuilder, &mut stdout)
}

pub(crate) fn run_annotate_with(
    args: AnnotateArgs,
    builder: &dyn PoiProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_annotate(&config, builder)?;
    write_json(writer, &summary)
}

pub(crate) fn execute_annotate(
    config: &AnnotateConfig,
    builder: &dyn PoiProviderBuilder,
) -> Result<AnnotateSummary, CliError> {
    let store_error = |source| CliError::GraphStore {
        area: config.area.clone(),
        source,
    };
    let store = FileGraphStore::new(config.graph_dir.clone());
    let network = store.load_area(&config.area).map_err(store_error)?;
    let pois = match network.bounds() {
        Some(bounds) => {
            let provider = builder.build(config)?;
            // Points up to one buffer outside the network still count.
            let margin = config.query.buffer_m.max(0.0) / METRES_PER_DEGREE;
            let bbox = Rect::new(
                Coord {
                    x: bounds.min().x - margin,
                    y: bounds.min().y - margin,
                },
                Coord {
                    x: bounds.max().x + margin,
                    y: bounds.max().y + margin,
                },
            );
            provider.pois_in_bbox(&bbox, &config.query)?
        }
        None => Vec::new(),
    };
    let annotated = annotate_poi_counts(&network, &pois, config.query.buffer_m);
    let path = store.save(&config.area, &annotated).map_err(store_error)?;
    Ok(AnnotateSummary {
        area: config.area.clone(),
        path,
        pois: pois.len(),
        edges: annotated.edge_count(),
        annotated_edges: annotated.edges().iter().filter(|e| e.poi_count > 0).count(),
    })
}
