//! End-to-end scenarios for the direct (non-interpolated) profile engine.

use halo_core::{
    HaloError, HaloModelConfig, HaloProfileModel, Mass, ParamName, Radius,
};

fn wmap7_model() -> HaloProfileModel {
    // Default construction is the WMAP7 cosmology with the HMCode shape and
    // the Duffy 2008 concentration relation.
    HaloProfileModel::with_defaults().expect("default model should construct")
}

#[test]
fn virial_radius_and_concentration_are_positive_across_mass_and_redshift() {
    let model = wmap7_model();

    for exponent in [13.0, 13.5, 14.0, 14.5, 15.0, 15.5, 16.0] {
        for z in [0.0, 0.25, 0.5, 1.0, 2.0] {
            let mass = Mass::from_log10_msun_h(exponent);
            let rvir = model.virial_radius(mass, z).expect("rvir");
            let concentration = model.concentration(mass, z).expect("concentration");

            assert!(rvir.mpc_h() > 0.0, "rvir at 10^{exponent}, z={z}");
            assert!(concentration > 0.0, "c at 10^{exponent}, z={z}");
        }
    }
}

#[test]
fn wmap7_pressure_profile_decreases_by_over_a_decade() {
    let model = wmap7_model();
    let profile = model
        .pe_profile(Mass::from_msun_h(1.0e14), 0.0)
        .expect("profile");

    let pressures: Vec<f64> = profile
        .electron_pressure
        .iter()
        .map(|pe| pe.kev_h2_cm3())
        .collect();

    assert_eq!(pressures.len(), 200);
    assert!(pressures.iter().all(|pe| *pe > 0.0));
    assert!(
        pressures.windows(2).all(|pair| pair[1] < pair[0]),
        "pressure must decrease monotonically over [0.1, 1] Rvir"
    );
    assert!(
        pressures[0] >= 10.0 * pressures[199],
        "inner pressure {:.3e} should dominate outer {:.3e} by >= 10x",
        pressures[0],
        pressures[199]
    );
}

#[test]
fn density_shape_matches_the_closed_form_up_to_normalization() {
    let model = wmap7_model();
    let mass = Mass::from_msun_h(1.0e14);
    let gamma = 1.177;

    let rvir = model.virial_radius(mass, 0.0).expect("rvir");
    let concentration = model.concentration(mass, 0.0).expect("concentration");
    let r_scale = rvir.mpc_h() / concentration;

    let mut ratios = Vec::new();
    for fraction in [0.1, 0.2, 0.35, 0.5, 0.75, 1.0] {
        let r = fraction * rvir.mpc_h();
        let x: f64 = r / r_scale;
        let closed_form = (x.ln_1p() / x).powf(1.0 / (gamma - 1.0));

        let density = model
            .bound_gas_density(mass, Radius::from_mpc_h(r), 0.0)
            .expect("density");
        ratios.push(density.msun_h2_mpc3() / closed_form);
    }

    // The normalization constant is shared, so every ratio collapses onto
    // the same value.
    let first = ratios[0];
    for ratio in &ratios {
        assert!((ratio / first - 1.0).abs() <= 1.0e-12);
    }
}

#[test]
fn mass_conservation_holds_for_every_shape_family() {
    for irho in [0, 1, 2] {
        let config = HaloModelConfig {
            irho,
            ..HaloModelConfig::default()
        };
        let model = HaloProfileModel::new(&config).expect("model");
        let mass = Mass::from_msun_h(2.0e14);

        let rvir = model.virial_radius(mass, 0.0).expect("rvir");
        let expected = model.bound_fraction(mass).expect("f_bnd") * mass.msun_h();

        let grid =
            halo_core::numerics::linear_grid(1.0e-5, rvir.mpc_h(), 4001).expect("grid");
        let fractions: Vec<f64> = grid.iter().map(|r| r / rvir.mpc_h()).collect();
        let profile = model.profile(mass, 0.0, &fractions).expect("profile");
        let integrand: Vec<f64> = grid
            .iter()
            .zip(profile.gas_density.iter())
            .map(|(r, rho)| 4.0 * std::f64::consts::PI * r * r * rho.msun_h2_mpc3())
            .collect();
        let enclosed =
            halo_core::numerics::integrate_simpson(&grid, &integrand).expect("integral");

        assert!(
            (enclosed - expected).abs() / expected <= 1.0e-3,
            "irho={irho}: enclosed={enclosed:.6e} expected={expected:.6e}"
        );
    }
}

#[test]
fn eps1_boundary_raises_a_domain_error_at_zero_redshift() {
    let mut model = wmap7_model();
    model
        .update_param(&[(ParamName::Eps1_0, -1.0), (ParamName::Eps1_1, 0.0)])
        .expect("parameter update itself is legal");

    for z in [0.0, 0.5, 1.0] {
        let result = model.concentration(Mass::from_msun_h(1.0e14), z);
        if z == 0.0 {
            let error = result.expect_err("eps1(0) = -1 is outside the domain");
            assert!(matches!(
                error,
                HaloError::ConcentrationUndefined { index: 1, .. }
            ));
        }
        // With eps1_1 = 0 the violation persists at every redshift.
        else {
            assert!(result.is_err());
        }
    }
}

#[test]
fn bound_fraction_saturates_at_the_universal_baryon_fraction() {
    let model = wmap7_model();
    let universal = model.cosmology().baryon_fraction();

    let huge = model
        .bound_fraction(Mass::from_msun_h(1.0e18))
        .expect("f_bnd");
    assert!(huge < universal);
    assert!(huge > 0.99 * universal);

    let tiny = model
        .bound_fraction(Mass::from_msun_h(1.0e10))
        .expect("f_bnd");
    assert!(tiny < 0.01 * universal);
}

#[test]
fn inner_pressure_scales_strongly_with_halo_mass() {
    let model = wmap7_model();

    let group = model
        .pe_profile(Mass::from_msun_h(1.0e13), 0.0)
        .expect("profile");
    let cluster = model
        .pe_profile(Mass::from_msun_h(1.0e15), 0.0)
        .expect("profile");

    // Self-similar scaling plus the rising bound fraction make Pe grow
    // faster than linearly in mass.
    let ratio = cluster.electron_pressure[0].kev_h2_cm3()
        / group.electron_pressure[0].kev_h2_cm3();
    assert!(ratio > 100.0, "Pe mass scaling too weak: ratio={ratio:.3e}");
}
