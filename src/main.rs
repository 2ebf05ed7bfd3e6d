use toll_sim::{Gantry, LatLng, SimState, Simulation, SimulationConfig};

/// Runs an offline simulation over a north-south route through Santiago
/// against a gantry catalogue, printing the final report.
///
/// Usage: toll-sim <catalogue.json>
fn main() {
    let path = std::env::args().nth(1).expect("usage: toll-sim <catalogue.json>");
    let gantries = Gantry::load_catalogue(&path).unwrap();
    println!("Loaded {} gantries from {}", gantries.len(), path);

    let route = [
        LatLng::new(-33.36, -70.68),
        LatLng::new(-33.42, -70.66),
        LatLng::new(-33.45, -70.65),
        LatLng::new(-33.52, -70.65),
        LatLng::new(-33.60, -70.70),
    ];

    let mut sim = Simulation::new();
    sim.set_route(&route).unwrap();
    sim.set_gantries(gantries);
    sim.start(SimulationConfig {
        seed: Some(1),
        ..Default::default()
    })
    .unwrap();
    println!("Bound {} gantries to the route", sim.bindings().len());

    while sim.state() == SimState::Running {
        sim.tick(1.0 / 60.0);
    }

    let stats = sim.stats();
    println!("Vehicles:  {}", stats.vehicles_spawned);
    println!("Crossings: {}", stats.crossings);
    println!("Revenue:   ${:.0} CLP", stats.total_revenue);
    for (gantry_id, revenue) in sim.gantry_totals() {
        println!("  {:<24} ${:.0}", gantry_id, revenue);
    }
}
