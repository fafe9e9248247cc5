//! Command-line surface.
//!
//! Flags select the phases to run: `--Create_SVG` renders the bump map,
//! `--Reparability_Statistics` resolves every fault with the capacity
//! solver, `--Repair_Solutions` runs the routing solver, and
//! `--Meta_Analysis` sweeps the electrical yield (optionally for a whole
//! system with `--System_Analysis`).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use cira_algo::{FaultKind, FaultModel, MultiFaultMode, YieldConfig};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "PascalCase")]
pub enum FaultTypeArg {
    Short,
    Open,
}

impl From<FaultTypeArg> for FaultKind {
    fn from(arg: FaultTypeArg) -> Self {
        match arg {
            FaultTypeArg::Short => FaultKind::Short,
            FaultTypeArg::Open => FaultKind::Open,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cira",
    version,
    about = "Analyze the repairability of a die-to-die chiplet interconnect interface"
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------
    /// Bump-map file (yaml/csv/json/xml)
    #[arg(long = "BumpMap_file_name")]
    pub bump_map_file: Option<PathBuf>,

    /// IRL file describing the rerouting resources
    #[arg(long = "IRL_file_name")]
    pub irl_file: Option<PathBuf>,

    /// Scaling factor applied to the X axis of the bump map
    #[arg(long = "Input_X_scale", default_value_t = 1.0)]
    pub input_x_scale: f64,

    /// Scaling factor applied to the Y axis of the bump map
    #[arg(long = "Input_Y_scale", default_value_t = 1.0)]
    pub input_y_scale: f64,

    // ------------------------------------------------------------------
    // SVG rendering
    // ------------------------------------------------------------------
    /// Render the bump map as SVG
    #[arg(long = "Create_SVG")]
    pub create_svg: bool,

    /// CSV file mapping bump types to colors and shapes
    #[arg(long = "Aspect_file_name")]
    pub aspect_file: Option<PathBuf>,

    /// Bump size factor, in µm
    #[arg(long = "Bump_Diameter", default_value_t = 1.0)]
    pub bump_diameter: f64,

    /// Interface pitch in µm; 0 derives it from the layout
    #[arg(long = "Pitch", default_value_t = 25.0)]
    pub pitch: f64,

    /// Display the bump-type legend
    #[arg(long = "Legend")]
    pub legend: bool,

    /// Margin around the map, as a multiple of the pitch
    #[arg(long = "Margin", default_value_t = 1.0)]
    pub margin: f64,

    /// Label each bump with its name
    #[arg(long = "Bump_Name")]
    pub bump_name: bool,

    /// Stroke color for bump outlines
    #[arg(long = "Stroke_color", default_value = "black")]
    pub stroke_color: String,

    /// Font family for labels
    #[arg(long = "Font", default_value = "Arial")]
    pub font: String,

    /// Font scale factor
    #[arg(long = "Font_Size", default_value_t = 1.0)]
    pub font_size: f64,

    /// Output path for the rendered SVG
    #[arg(long = "BumpMap_SVG_image_file_name", default_value = "output/BumpMap.svg")]
    pub svg_output: PathBuf,

    /// Overlay the resolved reparability of each 2-bump short on the SVG
    #[arg(long = "Display_Reparability_SVG")]
    pub display_reparability_svg: bool,

    // ------------------------------------------------------------------
    // Reparability analysis
    // ------------------------------------------------------------------
    /// Resolve every fault with the capacity solver and report statistics
    #[arg(long = "Reparability_Statistics")]
    pub reparability_statistics: bool,

    /// Resolve every fault with the routing solver and report assignments
    #[arg(long = "Repair_Solutions")]
    pub repair_solutions: bool,

    /// Output path for the enumerated fault table
    #[arg(long = "Fault_Table_file_name", default_value = "output/Fault_Table.csv")]
    pub fault_table_file: PathBuf,

    /// Output path for the capacity-resolved reparability table
    #[arg(
        long = "Reparability_Table_file_name",
        default_value = "output/Reparability_Table.csv"
    )]
    pub reparability_table_file: PathBuf,

    /// Output path for the routing-resolved solutions table
    #[arg(
        long = "Repair_Solutions_Table_file_name",
        default_value = "output/Repair_Solutions_Table.csv"
    )]
    pub repair_solutions_table_file: PathBuf,

    /// Echo each fault while it is being resolved
    #[arg(long = "Print_Fault")]
    pub print_fault: bool,

    // ------------------------------------------------------------------
    // Fault model
    // ------------------------------------------------------------------
    /// Fault mechanism to analyze
    #[arg(long = "Fault_Type", value_enum, default_value = "Short")]
    pub fault_type: FaultTypeArg,

    /// Fault multiplicity (simultaneous faults per pattern)
    #[arg(long = "Faults_Number", default_value_t = 1)]
    pub faults_number: usize,

    /// Upper threshold for the short distance, in µm
    #[arg(long = "Short_Distance", default_value_t = 26.0)]
    pub short_distance: f64,

    /// Number of bumps affected by each short
    #[arg(long = "Shorted_Bumps_Number", default_value_t = 2)]
    pub shorted_bumps_number: usize,

    /// Keep multi-fault patterns as distinct, non-overlapping sub-faults
    /// instead of merging them into one larger fault
    #[arg(long = "Distinct_Faults")]
    pub distinct_faults: bool,

    // ------------------------------------------------------------------
    // Yield sweep
    // ------------------------------------------------------------------
    /// Sweep the electrical yield with the Monte-Carlo estimator
    #[arg(long = "Meta_Analysis")]
    pub meta_analysis: bool,

    /// System description file for whole-system analysis
    #[arg(long = "System_description_file_name")]
    pub system_description_file: Option<PathBuf>,

    /// Compose per-interface yields into a system yield
    #[arg(long = "System_Analysis")]
    pub system_analysis: bool,

    /// Minimum electrical yield considered
    #[arg(long = "Min_Yield", default_value_t = 0.95)]
    pub min_yield: f64,

    /// Maximum electrical yield considered
    #[arg(long = "Max_Yield", default_value_t = 1.0)]
    pub max_yield: f64,

    /// Randomly generated faults per yield point
    #[arg(long = "Number_of_faults_tested", default_value_t = 100)]
    pub faults_tested: usize,

    /// Number of electrical yield steps
    #[arg(long = "Number_of_electrical_yield_tested", default_value_t = 10)]
    pub yields_tested: usize,

    /// Sweep 1 - 10^-i instead of a linear range
    #[arg(long = "Log_Scale")]
    pub log_scale: bool,

    /// Output path for the yield curve
    #[arg(long = "Yield_Table_file_name", default_value = "output/Yield_Table.csv")]
    pub yield_table_file: PathBuf,

    /// Seed for the Monte-Carlo estimator; omit for a nondeterministic run
    #[arg(long = "Seed")]
    pub seed: Option<u64>,

    // ------------------------------------------------------------------
    // Bundle repair mechanisms
    // ------------------------------------------------------------------
    /// Repair at bundle granularity instead of signal granularity
    #[arg(long = "Bundle_Flag")]
    pub bundle_flag: bool,
}

impl Cli {
    pub fn fault_model(&self) -> FaultModel {
        FaultModel::new(self.fault_type.into())
            .with_shorted_bumps(self.shorted_bumps_number)
            .with_multiplicity(self.faults_number)
            .with_short_distance(self.short_distance)
            .with_multi_mode(if self.distinct_faults {
                MultiFaultMode::Distinct
            } else {
                MultiFaultMode::Flatten
            })
    }

    pub fn yield_config(&self) -> YieldConfig {
        YieldConfig {
            min_yield: self.min_yield,
            max_yield: self.max_yield,
            samples: self.faults_tested,
            steps: self.yields_tested,
            log_scale: self.log_scale,
            bundle_mode: self.bundle_flag,
            seed: self.seed,
        }
    }
}
