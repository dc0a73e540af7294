//! End-to-end scenarios across the tacet crates.

use std::ops::ControlFlow;

use approx::assert_relative_eq;
use tacet::tacet_lbm::equilibrium;
use tacet::tacet_lbm::moments::inv_rho;
use tacet::{
    AnechoicBoundary, D2Q9, D3Q19, Descriptor, DynamicsKind, GuardianError, Lattice, Lattice2D,
    Lattice3D, MrtDynamics, Region, Simulation, SimulationConfig, StabilityMonitor,
};

/// Zero-mass acoustic pulse: a difference of Gaussians in density.
fn dog(r2: f64) -> f64 {
    let (amplitude, s1, s2) = (1e-3, 2.0, 4.0);
    amplitude * ((-r2 / (2.0 * s1 * s1)).exp() - (s1 / s2).powi(2) * (-r2 / (2.0 * s2 * s2)).exp())
}

fn set_pulse<L: Descriptor>(lattice: &mut Lattice<L>, profile: impl Fn(f64) -> f64) {
    let shape = lattice.shape();
    let center = shape.map(|n| (n / 2) as f64);
    for pos in lattice.bounding_box().iter() {
        let r2: f64 = (0..L::D).map(|a| (pos[a] as f64 - center[a]).powi(2)).sum();
        let rho_bar = profile(r2);
        let feq =
            equilibrium::populations::<L>(rho_bar, inv_rho(rho_bar), &L::Vect::default(), 0.0);
        lattice.cell_mut(pos).set_populations(feq);
    }
}

/// Sum of squared density offsets over cells at distance `b..b + 4` from
/// the lattice edge.
fn interior_energy(lattice: &Lattice2D, b: usize) -> f64 {
    let domain = lattice.bounding_box();
    domain
        .iter()
        .filter(|&pos| (b..b + 4).contains(&domain.distance_to_boundary(pos, 2)))
        .map(|pos| lattice.rho_bar_j(pos).0.powi(2))
        .sum()
}

fn total_density_energy<L: Descriptor>(lattice: &Lattice<L>) -> f64 {
    lattice
        .bounding_box()
        .iter()
        .map(|pos| lattice.rho_bar_j(pos).0.powi(2))
        .sum()
}

/// Run `steps` steps and return (final interior energy, peak interior energy).
fn run_sampled(lattice: &mut Lattice2D, b: usize, steps: usize) -> (f64, f64) {
    let mut peak = interior_energy(lattice, b);
    for _ in 0..steps {
        lattice.collide_and_stream();
        peak = peak.max(interior_energy(lattice, b));
    }
    (interior_energy(lattice, b), peak)
}

#[test]
fn quiescent_lattices_stay_at_rest() {
    let mut flat = Lattice2D::new_2d(24, 20, MrtDynamics::new(1.3));
    flat.toggle_all_periodic(false);
    AnechoicBoundary::new(5, 1.3).apply(&mut flat).unwrap();

    let mut cube = Lattice3D::new_3d(12, 10, 8, MrtDynamics::new(0.9));
    AnechoicBoundary::new(3, 0.9).apply(&mut cube).unwrap();

    for _ in 0..30 {
        flat.collide_and_stream();
        cube.collide_and_stream();
    }
    assert!(flat.cells().iter().all(|c| c.populations().iter().all(|&f| f == 0.0)));
    assert!(cube.cells().iter().all(|c| c.populations().iter().all(|&f| f == 0.0)));
    assert_eq!(flat.statistics().average_density(), 1.0);
}

#[test]
fn anechoic_buffer_absorbs_pulse() {
    let (n, b) = (64, 16);
    let mut lattice = Lattice2D::new_2d(n, n, MrtDynamics::new(1.0));
    lattice.toggle_all_periodic(false);
    let count = AnechoicBoundary::new(b, 1.0).apply(&mut lattice).unwrap();
    assert_eq!(count, n * n - (n - 2 * b) * (n - 2 * b));
    set_pulse(&mut lattice, dog);

    let (last, peak) = run_sampled(&mut lattice, b, 300);
    assert!(peak > 1e-9, "pulse never reached the interior: {peak:e}");
    assert!(last / peak < 1e-6, "reflected energy {:e} of peak", last / peak);
}

#[test]
fn periodic_box_keeps_pulse() {
    // Control for the absorption test: same pulse, no buffer.
    let (n, b) = (64, 16);
    let mut lattice = Lattice2D::new_2d(n, n, MrtDynamics::new(1.0));
    set_pulse(&mut lattice, dog);

    let (last, peak) = run_sampled(&mut lattice, b, 300);
    assert!(last / peak > 1e-3, "energy {:e} of peak", last / peak);
}

#[test]
fn anechoic_buffer_absorbs_pulse_in_3d() {
    let n = 20;
    let pulse = |r2: f64| 1e-3 * (-r2 / 4.0).exp();

    let mut open = Lattice3D::new_3d(n, n, n, MrtDynamics::new(1.0));
    open.toggle_all_periodic(false);
    AnechoicBoundary::new(5, 1.0).apply(&mut open).unwrap();
    set_pulse(&mut open, pulse);

    let mut closed = Lattice3D::new_3d(n, n, n, MrtDynamics::new(1.0));
    set_pulse(&mut closed, pulse);

    for _ in 0..120 {
        open.collide_and_stream();
        closed.collide_and_stream();
    }
    let absorbed = total_density_energy(&open);
    let kept = total_density_energy(&closed);
    assert!(absorbed < 0.1 * kept, "absorbed {absorbed:e}, kept {kept:e}");
}

#[test]
fn periodic_run_conserves_mass() {
    let mut lattice = Lattice::<D3Q19>::new_3d(10, 8, 6, MrtDynamics::new(1.6));
    set_pulse(&mut lattice, |r2| 1e-3 * (-r2 / 2.0).exp());

    let monitor = StabilityMonitor::new(&lattice)
        .with_mass_tolerance(1e-12)
        .with_interval(10);
    let mut sim = Simulation::new(lattice).with_monitor(monitor);

    let mut checks = 0;
    let report = sim
        .run(100, |_, _| {
            checks += 1;
            ControlFlow::Continue(())
        })
        .unwrap()
        .unwrap();
    assert_eq!(checks, 10);
    assert_eq!(report.iteration, 100);
    assert!(report.conservation.mass_error < 1e-12);
}

#[test]
fn simulation_from_config() {
    let json = r#"{
        "name": "square cylinder",
        "lattice": { "descriptor": "d2q9", "shape": [48, 32], "periodic": [false, false] },
        "relaxation": { "reynolds": { "mach": 0.1, "reynolds": 20.0, "length": 6.0 } },
        "initial": { "velocity": [0.02, 0.0] },
        "obstacles": [ { "min": [18, 13], "max": [23, 18] } ],
        "anechoic": { "thickness": 8, "target_velocity": [0.02, 0.0] },
        "run": { "steps": 60, "output_interval": 20 }
    }"#;
    let config = SimulationConfig::from_json_str(json).unwrap();
    let mut sim = Simulation::<D2Q9>::from_config(&config).unwrap();
    assert_eq!(sim.lattice().count_dynamics(DynamicsKind::BounceBack), 36);
    assert_eq!(sim.monitor().interval, 20);

    let report = sim
        .run(config.run.steps, |_, _| ControlFlow::Continue(()))
        .unwrap()
        .unwrap();
    assert_eq!(report.iteration, 60);
    assert!(report.max_velocity < 0.1);
    assert_relative_eq!(report.average_density, 1.0, epsilon = 1e-2);
    assert_eq!(sim.context().laps("collide_and_stream"), 60);
    assert!(Simulation::<D3Q19>::from_config(&config).is_err());
}

#[test]
fn caller_can_stop_the_loop() {
    let lattice = Lattice2D::new_2d(16, 16, MrtDynamics::new(1.0));
    let mut sim = Simulation::new(lattice);
    let report = sim
        .run(50, |lattice, _| {
            if lattice.iteration() >= 7 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap()
        .unwrap();
    assert_eq!(report.iteration, 7);
    assert_eq!(sim.lattice().iteration(), 7);
}

#[test]
fn monitor_stops_blown_up_run() {
    let mut lattice = Lattice2D::new_2d(16, 16, MrtDynamics::new(1.0));
    lattice
        .initialize_at_equilibrium(Region::new_2d(4, 6, 4, 6), 1.0, [0.01, 0.0])
        .unwrap();
    let mut sim = Simulation::new(lattice);
    sim.lattice_mut().cell_mut([8, 8, 0])[3] = f64::INFINITY;

    let err = sim.run(10, |_, _| ControlFlow::Continue(())).unwrap_err();
    assert_eq!(err, GuardianError::NonFinite { iteration: 1 });
}
