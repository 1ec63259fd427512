//! Volumetric fluence driven through the ausgab interface

mod common;

use approx::assert_relative_eq;
use common::{checkpoint, send, Slab};
use egstools_ausgab::*;
use egstools_fluence::{Error, VolumetricFluence, VolumetricInput};
use egstools_scoring::StateReader;
use rstest::rstest;

fn electrons(method: &str, scale: &str, emin: f64) -> VolumetricInput {
    serde_json::from_str(&format!(
        r#"{{
            "scoring particle": "electron",
            "scoring regions": [1],
            "score spectrum": true,
            "method": "{method}",
            "energy grid": {{
                "number of bins": 10,
                "minimum kinetic energy": {emin},
                "maximum kinetic energy": 1.0,
                "scale": "{scale}"
            }}
        }}"#
    ))
    .unwrap()
}

fn photons(extra: &str) -> VolumetricInput {
    serde_json::from_str(&format!(
        r#"{{
            "scoring particle": "photon",
            "scoring regions": "ALL",
            "score spectrum": true,
            "energy grid": {{ "number of bins": 10, "minimum kinetic energy": 0.0 }}
            {extra}
        }}"#
    ))
    .unwrap()
}

#[test]
fn flurz_spreads_a_step_over_bins() {
    let mut fluence = VolumetricFluence::new(&electrons("flurz", "linear", 0.0), &Slab::default())
        .unwrap();
    let mut stack = Stack::new();

    fluence.set_current_case(1);
    stack.push(Particle::new(Charge::Electron, 1.5).in_region(1));
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.3, 1.0));

    // 1 MeV down to 0.7 MeV over 1 cm
    let spectrum = fluence.spectrum(1).unwrap();
    for bin in 7..10 {
        assert_relative_eq!(spectrum.current_result(bin).0, 1.0 / 0.3, max_relative = 1e-9);
    }
    assert!(spectrum.current_result(6).0 < 1e-9);
    assert_relative_eq!(fluence.total().current_result(1).0, 1.0, max_relative = 1e-9);
    assert_eq!(fluence.diagnostics().multi_bin, 1);
}

#[rstest]
#[case("stpwr", "linear", 0.0)]
#[case("stpwrO5", "linear", 0.0)]
#[case("stpwr", "log", 0.01)]
#[case("stpwrO5", "log", 0.01)]
fn stopping_power_track_length(#[case] method: &str, #[case] scale: &str, #[case] emin: f64) {
    let mut fluence =
        VolumetricFluence::new(&electrons(method, scale, emin), &Slab::default()).unwrap();
    let mut stack = Stack::new();

    fluence.set_current_case(1);
    stack.push(Particle::new(Charge::Electron, 1.4).in_region(1));
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.3, 1.0));

    // 0.3 MeV lost at 2 MeV/cm, whatever the curved path length
    assert_relative_eq!(fluence.total().current_result(1).0, 0.15, max_relative = 1e-9);
}

#[test]
fn charged_steps_need_energy_loss() {
    let mut fluence = VolumetricFluence::new(&electrons("flurz", "linear", 0.0), &Slab::default())
        .unwrap();
    let mut stack = Stack::new();

    fluence.set_current_case(1);
    stack.push(Particle::new(Charge::Electron, 1.0).in_region(1));
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.0, 1.0));

    // wrong region and wrong particle
    stack.push(Particle::new(Charge::Electron, 1.0).in_region(2));
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.1, 1.0));
    stack.push(Particle::new(Charge::Positron, 1.0).in_region(1));
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.1, 1.0));

    assert_eq!(fluence.total().current_result(1), (0.0, 0.0));
}

#[test]
fn photon_track_length() {
    let mut fluence = VolumetricFluence::new(&photons(""), &Slab::default()).unwrap();
    let mut stack = Stack::new();

    for ncase in 1..=2 {
        fluence.set_current_case(ncase);
        stack.push(Particle::new(Charge::Photon, 0.55).in_region(0).with_weight(2.0));
        send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.0, 1.5));
        // discards are not scored for photons
        send(&mut fluence, &mut stack, AusgabCall::UserDiscard, StepInfo::new(0.0, 1.5));
        stack.clear();
    }

    assert_eq!(fluence.total().current_result(0), (3.0, 0.0));
    assert_eq!(fluence.spectrum(0).unwrap().current_result(5), (3.0, 0.0));
    assert!(fluence.primary_total().is_none());
}

#[test]
fn secondaries_are_left_out_of_primary_results() {
    let input = photons(r#", "score primaries": true, "source regions": [0]"#);
    let app = Slab {
        source: Some(Charge::Photon),
        ..Default::default()
    };
    let mut fluence = VolumetricFluence::new(&input, &app).unwrap();
    let mut stack = Stack::new();
    fluence.set_current_case(1);

    // scattered in a source region, still primary
    stack.push(Particle::new(Charge::Photon, 0.55).in_region(0));
    stack.interact([Particle::new(Charge::Photon, 0.45)]);
    send(&mut fluence, &mut stack, AusgabCall::AfterCompton, StepInfo::default());
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.0, 1.0));

    // scattered downstream, secondary from now on
    stack.clear();
    stack.push(Particle::new(Charge::Photon, 0.55).in_region(2));
    stack.interact([Particle::new(Charge::Photon, 0.45)]);
    send(&mut fluence, &mut stack, AusgabCall::AfterCompton, StepInfo::default());
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.0, 1.0));

    let primary = fluence.primary_total().unwrap();
    assert_eq!(primary.current_result(0).0, 1.0);
    assert_eq!(primary.current_result(2).0, 0.0);
    assert_eq!(fluence.total().current_result(2).0, 1.0);
    assert!(fluence.describe().contains(" - source particle: photon\n"));
}

#[rstest]
#[case("stpwr", true)]
#[case("stpwrO5", true)]
#[case("flurz", false)]
fn range_rejection(#[case] method: &str, #[case] fails: bool) {
    let app = Slab {
        range_rejection: true,
        ..Default::default()
    };
    let result = VolumetricFluence::new(&electrons(method, "linear", 0.0), &app);
    assert_eq!(matches!(result, Err(Error::RangeRejection(_))), fails);
}

#[test]
fn cutoff_drops_low_bins() {
    let app = Slab {
        ecut: 0.75,
        ..Default::default()
    };
    let fluence = VolumetricFluence::new(&electrons("flurz", "linear", 0.0), &app).unwrap();
    assert_eq!(fluence.grid().bins(), 8);
    assert_relative_eq!(fluence.grid().emin(), 0.2, max_relative = 1e-9);
}

#[test]
fn checkpoints_restart_and_combine() {
    let input = photons(r#", "score primaries": true"#);
    let mut fluence = VolumetricFluence::new(&input, &Slab::default()).unwrap();
    let mut stack = Stack::new();
    for ncase in 1..=4 {
        fluence.set_current_case(ncase);
        stack.push(Particle::new(Charge::Photon, 0.1 * ncase as f64).in_region(1));
        send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.0, 1.0));
        stack.clear();
    }
    let text = checkpoint(&fluence);

    let mut restored = VolumetricFluence::new(&input, &Slab::default()).unwrap();
    let mut reader = StateReader::new(&text);
    restored.set_state(&mut reader).unwrap();
    assert!(reader.is_exhausted());
    assert_eq!(restored.current_case(), 4);
    assert_eq!(restored.total().current_result(1), fluence.total().current_result(1));
    assert_eq!(checkpoint(&restored), text);

    // a second identical run doubles the histories and keeps the mean
    restored.add_state(&mut StateReader::new(&text)).unwrap();
    assert_eq!(restored.current_case(), 8);
    assert_relative_eq!(
        restored.total().current_result(1).0,
        fluence.total().current_result(1).0
    );

    restored.reset_counter();
    assert_eq!(restored.current_case(), 0);
    assert_eq!(restored.total().current_score(1), (0.0, 0.0));
}

#[test]
fn report_is_per_unit_volume_and_fluence() {
    let input = photons(r#", "volumes": [2.0], "verbose": true"#);
    let app = Slab {
        fluence: Some(10.0),
        ..Default::default()
    };
    let mut fluence = VolumetricFluence::new(&input, &app).unwrap();
    let mut stack = Stack::new();
    fluence.set_current_case(1);
    stack.push(Particle::new(Charge::Photon, 0.55).in_region(0));
    send(&mut fluence, &mut stack, AusgabCall::BeforeTransport, StepInfo::new(0.0, 4.0));

    // 4 cm / 2 cm3 / (10 per history)
    let report = fluence.report(&app);
    assert!(report.contains("Total photon fluence"));
    assert!(report.contains("2.0000e-01 +/- 0.0000e+00"));
    assert!(report.contains("Differential fluence output"));

    let mut buffer = Vec::new();
    fluence.write_spectrum(&mut buffer, &app).unwrap();
    let agr = String::from_utf8(buffer).unwrap();
    assert!(agr.contains("@    s0 legend \"total (ir # 0)\""));
    assert_eq!(agr.matches("@type xydy").count(), 3);
}
