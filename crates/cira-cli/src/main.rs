use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use cira_algo::{
    estimate_interface_yield, estimate_system_yield, fault_table, io as tables,
    resolve_with_capacity, resolve_with_routing, yield_range, FaultRecord, RepairSummary,
    SystemInterface,
};
use cira_core::{BumpTable, Diagnostics, RouteTable};
use cira_io::{load_bump_map, load_irl, load_system_description};
use cira_viz::{load_aspect, render_bump_map, FaultOverlay, SvgOptions};

mod cli;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !(cli.create_svg || cli.reparability_statistics || cli.repair_solutions || cli.meta_analysis)
    {
        info!(
            "nothing to do; select a phase with --Create_SVG, --Reparability_Statistics, \
             --Repair_Solutions or --Meta_Analysis"
        );
        return Ok(());
    }

    if cli.create_svg {
        run_render(cli)?;
    }
    if cli.reparability_statistics {
        run_statistics(cli)?;
    }
    if cli.repair_solutions {
        run_solutions(cli)?;
    }
    if cli.meta_analysis {
        run_meta_analysis(cli)?;
    }
    Ok(())
}

/// Load and cross-check the interface description named on the command line.
fn load_interface(cli: &Cli) -> Result<(BumpTable, RouteTable)> {
    let Some(bump_map_file) = &cli.bump_map_file else {
        bail!("missing --BumpMap_file_name");
    };
    let Some(irl_file) = &cli.irl_file else {
        bail!("missing --IRL_file_name");
    };
    let bumps = load_bump_map(bump_map_file, cli.input_x_scale, cli.input_y_scale)
        .with_context(|| format!("loading bump map '{}'", bump_map_file.display()))?;
    let routes =
        load_irl(irl_file).with_context(|| format!("loading IRL '{}'", irl_file.display()))?;
    routes.validate_references(&bumps)?;
    info!(
        "loaded interface: {} bumps ({} spares), {} route rows over {} chains",
        bumps.len(),
        bumps.spare_count(),
        routes.len(),
        routes.chains().len()
    );
    Ok((bumps, routes))
}

fn report_diagnostics(diag: &Diagnostics) {
    for issue in &diag.issues {
        warn!("{issue}");
    }
}

fn echo_faults(cli: &Cli, records: &[FaultRecord]) {
    for record in records {
        if cli.print_fault {
            info!("{:?}", record.fault);
        } else {
            debug!("{:?}", record.fault);
        }
    }
}

fn run_render(cli: &Cli) -> Result<()> {
    let Some(bump_map_file) = &cli.bump_map_file else {
        bail!("missing --BumpMap_file_name");
    };
    let Some(aspect_file) = &cli.aspect_file else {
        bail!("missing --Aspect_file_name");
    };
    let bumps = load_bump_map(bump_map_file, cli.input_x_scale, cli.input_y_scale)
        .with_context(|| format!("loading bump map '{}'", bump_map_file.display()))?;
    let aspect = load_aspect(aspect_file)
        .with_context(|| format!("loading aspect file '{}'", aspect_file.display()))?;

    // The overlay needs resolved tags, which needs the IRL.
    let mut overlay = Vec::new();
    if cli.display_reparability_svg {
        let Some(irl_file) = &cli.irl_file else {
            bail!("--Display_Reparability_SVG needs --IRL_file_name");
        };
        let routes = load_irl(irl_file)?;
        routes.validate_references(&bumps)?;
        let mut records = fault_table(&cli.fault_model(), &bumps, &routes)?;
        resolve_with_capacity(&mut records, &bumps, &routes);
        overlay = records
            .into_iter()
            .map(|record| FaultOverlay {
                bumps: record.fault,
                tag: record.tag,
            })
            .collect();
    }

    let options = SvgOptions {
        bump_diameter: cli.bump_diameter,
        pitch: cli.pitch,
        margin: cli.margin,
        legend: cli.legend,
        bump_names: cli.bump_name,
        stroke_color: cli.stroke_color.clone(),
        font: cli.font.clone(),
        font_size: cli.font_size,
    };

    let mut diag = Diagnostics::new();
    let svg = render_bump_map(&bumps, &aspect, &options, &overlay, &mut diag)?;
    report_diagnostics(&diag);

    write_output(&cli.svg_output, &svg)?;
    info!("wrote bump map to {}", cli.svg_output.display());
    Ok(())
}

fn run_statistics(cli: &Cli) -> Result<()> {
    let (bumps, routes) = load_interface(cli)?;
    let model = cli.fault_model();

    let mut records = fault_table(&model, &bumps, &routes)?;
    echo_faults(cli, &records);
    tables::write_fault_table(&cli.fault_table_file, &records)?;

    resolve_with_capacity(&mut records, &bumps, &routes);
    tables::write_reparability_table(&cli.reparability_table_file, &records)?;

    let summary = RepairSummary::from_records(&records);
    info!("capacity solver: {summary}");
    info!(
        "wrote {} and {}",
        cli.fault_table_file.display(),
        cli.reparability_table_file.display()
    );
    Ok(())
}

fn run_solutions(cli: &Cli) -> Result<()> {
    let (bumps, routes) = load_interface(cli)?;
    let model = cli.fault_model();

    let mut records = fault_table(&model, &bumps, &routes)?;
    echo_faults(cli, &records);
    tables::write_fault_table(&cli.fault_table_file, &records)?;

    resolve_with_routing(&mut records, &bumps, &routes);
    tables::write_repair_solutions_table(&cli.repair_solutions_table_file, &records)?;

    let summary = RepairSummary::from_records(&records);
    info!("routing solver: {summary}");
    info!("wrote {}", cli.repair_solutions_table_file.display());
    Ok(())
}

fn run_meta_analysis(cli: &Cli) -> Result<()> {
    let config = cli.yield_config();
    info!("yield range: {:?}", yield_range(&config));

    if cli.system_analysis {
        let Some(system_file) = &cli.system_description_file else {
            bail!("--System_Analysis needs --System_description_file_name");
        };
        let system = load_system_description(system_file)?;
        let base_dir = system_file.parent().unwrap_or_else(|| Path::new("."));

        let mut interfaces = Vec::new();
        for (die_id, descriptor) in &system.dies {
            let bump_path = base_dir.join(&descriptor.bump_map_file);
            let irl_path = base_dir.join(&descriptor.irl_file);
            let bumps = load_bump_map(&bump_path, 1.0, 1.0)
                .with_context(|| format!("loading bump map for die '{die_id}'"))?;
            let routes = load_irl(&irl_path)
                .with_context(|| format!("loading IRL for die '{die_id}'"))?;
            routes.validate_references(&bumps)?;
            interfaces.push(SystemInterface {
                die_id: die_id.clone(),
                bumps,
                routes,
                die_number: descriptor.die_number,
                interface_number: descriptor.interface_number,
                die_surface: descriptor.resources.surface,
            });
        }

        let points = estimate_system_yield(&interfaces, &config)?;
        tables::write_system_yield_table(&cli.yield_table_file, &points)?;
        for point in &points {
            info!(
                "y = {:.6}: system yield without repair {:.4}, with repair {:.4}",
                point.electrical_yield, point.without_repair, point.with_repair
            );
        }
    } else {
        let (bumps, routes) = load_interface(cli)?;
        let points = estimate_interface_yield(&bumps, &routes, &config)?;
        tables::write_yield_table(&cli.yield_table_file, &points)?;
        for point in &points {
            info!(
                "y = {:.6}: yield without repair {:.4}, with repair {:.4}",
                point.electrical_yield, point.without_repair, point.with_repair
            );
        }
    }

    info!("wrote {}", cli.yield_table_file.display());
    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))?;
        }
    }
    fs::write(path, content).with_context(|| format!("writing '{}'", path.display()))
}
