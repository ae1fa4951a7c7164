use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use halo_core::numerics::log_grid;
use halo_core::{
    GasProfile, GasShape, HaloError, HaloModelConfig, HaloProfileModel, Mass, MassConcentration,
};

use super::CliError;

#[derive(clap::Args)]
pub(super) struct ProfileArgs {
    /// Halo virial mass [Msun/h]
    #[arg(long)]
    mass: f64,

    /// Redshift
    #[arg(long, default_value_t = 0.0)]
    redshift: f64,

    /// Inner radius as a fraction of the virial radius
    #[arg(long, default_value_t = 0.1)]
    rmin: f64,

    /// Outer radius as a fraction of the virial radius
    #[arg(long, default_value_t = 1.0)]
    rmax: f64,

    /// Number of logarithmic radial bins
    #[arg(long, default_value_t = 200)]
    bins: usize,

    /// JSON model configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parameter overrides, e.g. --set gamma=1.25
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// JSON artifact path; prints a summary to stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ValidateInterpArgs {
    /// JSON model configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validation sample size (random masses per redshift)
    #[arg(long, default_value_t = 1000)]
    samples: usize,
}

#[derive(clap::Args)]
pub(super) struct DescribeArgs {
    /// JSON model configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parameter overrides, e.g. --set log10_M0=14
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
}

#[derive(Serialize)]
struct ProfileArtifact {
    mass_msun_h: f64,
    redshift: f64,
    virial_radius_mpc_h: f64,
    concentration: f64,
    profile: GasProfile,
}

pub(super) fn run_profile_command(args: ProfileArgs) -> Result<i32, CliError> {
    let config = load_config(args.config.as_deref())?;
    let mut model = HaloProfileModel::new(&config)?;
    apply_overrides(&mut model, &args.set)?;

    let fractions = log_grid(args.rmin, args.rmax, args.bins).ok_or_else(|| {
        CliError::Usage(format!(
            "invalid radial binning: rmin={}, rmax={}, bins={}",
            args.rmin, args.rmax, args.bins
        ))
    })?;

    let mass = Mass::from_msun_h(args.mass);
    let profile = model.profile(mass, args.redshift, &fractions)?;
    let artifact = ProfileArtifact {
        mass_msun_h: args.mass,
        redshift: args.redshift,
        virial_radius_mpc_h: model.virial_radius(mass, args.redshift)?.mpc_h(),
        concentration: model.concentration(mass, args.redshift)?,
        profile,
    };

    match &args.output {
        Some(path) => {
            write_json_artifact(path, &artifact)?;
            info!(path = %path.display(), "profile artifact written");
        }
        None => {
            let inner = artifact.profile.electron_pressure[0].kev_h2_cm3();
            let outer = artifact.profile.electron_pressure[artifact.profile.r_fractions.len() - 1]
                .kev_h2_cm3();
            println!(
                "M = {:.3e} Msun/h, z = {}: Rvir = {:.4} Mpc/h, c = {:.3}",
                artifact.mass_msun_h,
                artifact.redshift,
                artifact.virial_radius_mpc_h,
                artifact.concentration
            );
            println!(
                "Pe({}Rvir) = {:.4e} keV h^2/cm^3, Pe({}Rvir) = {:.4e} keV h^2/cm^3",
                args.rmin, inner, args.rmax, outer
            );
        }
    }

    Ok(0)
}

pub(super) fn run_validate_interp_command(args: ValidateInterpArgs) -> Result<i32, CliError> {
    let mut config = load_config(args.config.as_deref())?;
    config.use_interp = true;

    let model = HaloProfileModel::new(&config)?;
    match model.validate_interpolation(args.samples) {
        Ok(()) => {
            println!(
                "Interpolation accuracy within {:.4}% for {} redshift(s).",
                config.interp_error_tol * 100.0,
                config.zs.len()
            );
            Ok(0)
        }
        Err(error @ HaloError::InterpolationAccuracy { .. }) => {
            eprintln!("{error}");
            Ok(1)
        }
        Err(error) => Err(error.into()),
    }
}

pub(super) fn run_describe_command(args: DescribeArgs) -> Result<i32, CliError> {
    let config = load_config(args.config.as_deref())?;
    let mut model = HaloProfileModel::new(&config)?;
    apply_overrides(&mut model, &args.set)?;

    println!("{}", render_describe(&model));
    Ok(0)
}

fn load_config(path: Option<&Path>) -> Result<HaloModelConfig, CliError> {
    let Some(path) = path else {
        return Ok(HaloModelConfig::default());
    };

    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration '{}'", path.display()))?;
    let config: HaloModelConfig = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse configuration '{}'", path.display()))?;
    Ok(config)
}

fn apply_overrides(model: &mut HaloProfileModel, overrides: &[String]) -> Result<(), CliError> {
    if overrides.is_empty() {
        return Ok(());
    }

    let mut updates = Vec::with_capacity(overrides.len());
    for entry in overrides {
        let Some((name, value)) = entry.split_once('=') else {
            return Err(CliError::Usage(format!(
                "invalid override '{entry}'; expected NAME=VALUE"
            )));
        };
        let value: f64 = value.trim().parse().map_err(|_| {
            CliError::Usage(format!("invalid numeric value in override '{entry}'"))
        })?;
        updates.push((name.trim(), value));
    }

    model.update_param_by_name(&updates)?;
    Ok(())
}

fn write_json_artifact(path: &Path, artifact: &ProfileArtifact) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
    }

    let rendered = serde_json::to_string_pretty(artifact).context("failed to encode artifact")?;
    fs::write(path, rendered)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

fn render_describe(model: &HaloProfileModel) -> String {
    let cosmology = model.cosmology();
    let globals = model.global_params();
    let weights = model.molecular_weights();
    let interp = model.interpolation();

    let mut out = String::new();
    out.push_str("Cosmology\n---------\n");
    out.push_str(&format!("omega_m = {}\n", cosmology.omega_m));
    out.push_str(&format!("omega_b = {}\n", cosmology.omega_b));
    out.push_str(&format!("h = {}\n\n", cosmology.h));

    out.push_str("Global Halo Parameters\n----------------------\n");
    out.push_str(&format!("f_H = {}\n", globals.f_h));
    out.push_str(&format!("alpha = {}\n", globals.alpha));
    out.push_str(&format!("gamma_T = {}\n", globals.gamma_t));
    out.push_str(&format!("M0 = {:.4e} Msun/h\n", globals.m0.msun_h()));
    out.push_str(&format!("beta = {}\n", globals.beta));
    out.push_str(&format!(
        "eps1 = {} + {} z\neps2 = {} + {} z\n",
        globals.eps1_0, globals.eps1_1, globals.eps2_0, globals.eps2_1
    ));
    out.push_str(&format!("rescale_A = {}\n", globals.rescale_a));
    out.push_str(&format!(
        "alpha_nt = {}, n_nt = {}\n\n",
        globals.alpha_nt, globals.n_nt
    ));

    out.push_str("Profile Shape\n-------------\n");
    match model.gas_shape() {
        GasShape::Polytropic { gamma } => {
            out.push_str(&format!("family = default HMCode\ngamma = {gamma}\n\n"));
        }
        GasShape::MassScaledPolytropic { gamma, a } => {
            out.push_str(&format!(
                "family = mass dependent gamma\ngamma = {gamma}\na = {a}\n\n"
            ));
        }
        GasShape::EGnfw {
            gamma_0,
            gamma_1,
            beta_0,
            beta_1,
            eta,
        } => {
            out.push_str(&format!(
                "family = e-GNFW\ngamma_0 = {gamma_0}\ngamma_1 = {gamma_1}\n\
                 beta_0 = {beta_0}\nbeta_1 = {beta_1}\neta = {eta}\n\n"
            ));
        }
    }

    out.push_str("Concentration Relation\n----------------------\n");
    match model.mass_concentration() {
        MassConcentration::Fixed { concentration } => {
            out.push_str(&format!("relation = fixed\nconc_param = {concentration}\n\n"));
        }
        relation => out.push_str(&format!("relation = {}\n\n", relation.label())),
    }

    out.push_str("Derived Parameters\n------------------\n");
    out.push_str(&format!("mu_e = {}\n", weights.mu_e));
    out.push_str(&format!("mu_p = {}\n\n", weights.mu_p));

    out.push_str("Interpolation\n-------------\n");
    if interp.enabled {
        out.push_str(&format!(
            "use_interp = true\nzs = {:?}\nmmin = {:.3e} Msun/h\nmmax = {:.3e} Msun/h\n\
             interp_error_tol = {}\n",
            interp.zs, interp.mmin, interp.mmax, interp.error_tol
        ));
    } else {
        out.push_str("use_interp = false\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{apply_overrides, render_describe};
    use halo_core::{HaloModelConfig, HaloProfileModel};

    #[test]
    fn overrides_parse_and_apply_in_order() {
        let mut model = HaloProfileModel::with_defaults().expect("model");
        apply_overrides(
            &mut model,
            &["gamma=1.3".to_string(), "log10_M0 = 14".to_string()],
        )
        .expect("overrides");

        assert!((model.global_params().m0.msun_h() - 1.0e14).abs() / 1.0e14 <= 1.0e-12);
    }

    #[test]
    fn malformed_overrides_are_usage_errors() {
        let mut model = HaloProfileModel::with_defaults().expect("model");
        assert!(apply_overrides(&mut model, &["gamma".to_string()]).is_err());
        assert!(apply_overrides(&mut model, &["gamma=abc".to_string()]).is_err());
    }

    #[test]
    fn describe_renders_every_section() {
        let config = HaloModelConfig {
            use_interp: false,
            ..HaloModelConfig::default()
        };
        let model = HaloProfileModel::new(&config).expect("model");
        let rendered = render_describe(&model);

        for heading in [
            "Cosmology",
            "Global Halo Parameters",
            "Profile Shape",
            "Concentration Relation",
            "Derived Parameters",
            "Interpolation",
        ] {
            assert!(rendered.contains(heading), "missing section '{heading}'");
        }
        assert!(rendered.contains("default HMCode"));
        assert!(rendered.contains("use_interp = false"));
    }
}
