//! Planar fluence driven through the ausgab interface

mod common;

use approx::assert_relative_eq;
use common::{checkpoint, send, Slab};
use egstools_ausgab::*;
use egstools_fluence::{PlanarFluence, PlanarInput};
use egstools_scoring::StateReader;
use egstools_transform::Vector;
use rstest::{fixture, rstest};

fn input(json: &str) -> PlanarInput {
    serde_json::from_str(json).unwrap()
}

/// Photon circle of radius 2 cm at z = 10
#[fixture]
fn circle() -> PlanarFluence {
    let input = input(
        r#"{
            "scoring particle": "photon",
            "scoring circle": [0, 0, 10, 2],
            "scoring plane normal": [0, 0, 1],
            "score spectrum": true,
            "energy grid": { "number of bins": 10, "minimum kinetic energy": 0.0 }
        }"#,
    );
    PlanarFluence::new(&input, &Slab::default()).unwrap()
}

/// Move the top particle along its direction
fn advance(stack: &mut Stack, distance: f64) {
    if let Some(p) = stack.top_mut() {
        p.position += p.direction * distance;
    }
}

/// One transport step of `distance`
fn transport<O: AusgabObject>(object: &mut O, stack: &mut Stack, distance: f64) {
    let step = StepInfo::new(0.0, distance);
    send(object, stack, AusgabCall::BeforeTransport, step);
    advance(stack, distance);
    send(object, stack, AusgabCall::AfterTransport, step);
}

#[rstest]
fn scores_once_the_plane_is_reached(mut circle: PlanarFluence) {
    let mut stack = Stack::new();
    circle.set_current_case(1);
    stack.push(
        Particle::new(Charge::Photon, 0.55)
            .at(Vector::new(1.0, 0.0, 0.0))
            .towards(Vector::z())
            .in_region(0)
            .with_weight(2.0),
    );

    transport(&mut circle, &mut stack, 6.0);
    assert_eq!(circle.reached(), 0.0);

    transport(&mut circle, &mut stack, 6.0);
    assert_eq!(circle.reached(), 2.0);
    assert_eq!(circle.total().current_result(0), (2.0, 0.0));
    assert_eq!(circle.spectrum(0).unwrap().current_result(5), (2.0, 0.0));

    // already beyond the plane
    transport(&mut circle, &mut stack, 6.0);
    assert_eq!(circle.reached(), 2.0);
}

#[rstest]
#[case(Vector::new(0.0, 0.6, 0.8), 1.0 / 0.8)]
#[case(Vector::new(0.0, 0.9975_f64.sqrt(), 0.05), 1.0 / 0.0871557)]
fn oblique_crossings(mut circle: PlanarFluence, #[case] u: Vector, #[case] expected: f64) {
    let mut stack = Stack::new();
    circle.set_current_case(1);

    // aimed at the centre of the field
    let start = Vector::new(0.0, 0.0, 10.0) - u * (9.0 / u.z);
    stack.push(Particle::new(Charge::Photon, 0.55).at(start).towards(u).in_region(0));
    transport(&mut circle, &mut stack, 1000.0);

    assert_relative_eq!(circle.total().current_result(0).0, expected, max_relative = 1e-6);
}

#[rstest]
fn other_particles_are_ignored(mut circle: PlanarFluence) {
    let mut stack = Stack::new();
    circle.set_current_case(1);
    stack.push(Particle::new(Charge::Electron, 1.0).towards(Vector::z()).in_region(0));
    transport(&mut circle, &mut stack, 20.0);

    // misses the field
    stack.push(
        Particle::new(Charge::Photon, 1.0)
            .at(Vector::new(3.0, 0.0, 0.0))
            .towards(Vector::z())
            .in_region(0),
    );
    transport(&mut circle, &mut stack, 20.0);
    assert_eq!(circle.reached(), 0.0);
}

#[rstest]
#[case(Vector::new(-1.5, -0.5, 0.0), 0)]
#[case(Vector::new(1.5, -0.5, 0.0), 3)]
#[case(Vector::new(0.2, 0.7, 0.0), 6)]
fn rectangle_pixels(#[case] start: Vector, #[case] pixel: usize) {
    let input = input(
        r#"{
            "scoring particle": "electron",
            "scoring rectangle": [-2, 2, -1, 1],
            "resolution": [4, 2],
            "translation": [0, 0, 10],
            "contributing regions": [1]
        }"#,
    );
    let mut fluence = PlanarFluence::new(&input, &Slab::default()).unwrap();
    assert_eq!(fluence.field().pixels(), 8);

    let mut stack = Stack::new();
    fluence.set_current_case(1);

    // not in a contributing region
    stack.push(Particle::new(Charge::Electron, 1.0).at(start).towards(Vector::z()).in_region(0));
    transport(&mut fluence, &mut stack, 15.0);
    assert_eq!(fluence.total().current_result(pixel).0, 0.0);

    stack.clear();
    stack.push(Particle::new(Charge::Electron, 1.0).at(start).towards(Vector::z()).in_region(1));
    transport(&mut fluence, &mut stack, 15.0);
    assert_eq!(fluence.total().current_result(pixel).0, 1.0);
    assert_eq!(fluence.reached(), 1.0);

    let report = fluence.report(&Slab::default());
    assert!(report.contains("iy  ix  k"));
}

#[test]
fn primaries_and_checkpoints() {
    let input = input(
        r#"{
            "scoring particle": "photon",
            "source particle": "photon",
            "score primaries": true,
            "source regions": [0],
            "scoring circle": [0, 0, 10, 2],
            "scoring plane normal": [0, 0, 1]
        }"#,
    );
    let mut fluence = PlanarFluence::new(&input, &Slab::default()).unwrap();
    let mut stack = Stack::new();

    for ncase in 1..=2 {
        fluence.set_current_case(ncase);
        stack.push(Particle::new(Charge::Photon, 0.55).towards(Vector::z()).in_region(1));
        stack.interact([Particle::new(Charge::Photon, 0.45).towards(Vector::z())]);
        send(&mut fluence, &mut stack, AusgabCall::AfterCompton, StepInfo::default());
        transport(&mut fluence, &mut stack, 20.0);

        stack.clear();
        stack.push(Particle::new(Charge::Photon, 0.55).towards(Vector::z()).in_region(1));
        transport(&mut fluence, &mut stack, 20.0);
        stack.clear();
    }

    assert_eq!(fluence.reached(), 4.0);
    assert_eq!(fluence.primaries_reached(), 2.0);
    assert_eq!(fluence.primary_total().unwrap().current_result(0), (1.0, 0.0));

    let text = checkpoint(&fluence);
    assert_eq!(text.lines().nth(1), Some("4e0 2e0"));

    let mut restored = PlanarFluence::new(&input, &Slab::default()).unwrap();
    restored.set_state(&mut StateReader::new(&text)).unwrap();
    restored.add_state(&mut StateReader::new(&text)).unwrap();
    assert_eq!(restored.current_case(), 4);
    assert_eq!(restored.reached(), 8.0);
    assert_eq!(restored.total().current_result(0), (2.0, 0.0));
}

#[test]
fn report_per_unit_area() {
    let input = input(
        r#"{
            "scoring particle": "photon",
            "scoring circle": [0, 0, 10, 1],
            "scoring plane normal": [0, 0, 1]
        }"#,
    );
    let mut fluence = PlanarFluence::new(&input, &Slab::default()).unwrap();
    let mut stack = Stack::new();
    fluence.set_current_case(1);
    stack.push(Particle::new(Charge::Photon, 0.55).towards(Vector::z()).in_region(0));
    transport(&mut fluence, &mut stack, 20.0);

    // 1 / pi cm2
    let report = fluence.report(&Slab::default());
    assert!(report.contains("3.1831e-01 +/- 0.0000e+00"));
    assert!(fluence.describe().contains(" - scoring field radius      = 1 cm\n"));
}
