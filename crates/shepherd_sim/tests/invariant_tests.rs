//! Invariant tests for shepherd_sim
//!
//! These hold for every session, whatever the seed or the inputs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shepherd_math::consts::SQRT_2;
use shepherd_nav::route::JOIN_EPSILON;
use shepherd_sim::prelude::*;

fn busy_config(seed: u64) -> SessionConfig {
    SessionConfig::hard()
        .with_seed(seed)
        .with_initial_flock(150)
        .with_obstacles(vec![
            Obstacle::new(Vec2::new(1000.0, 1000.0), 80.0),
            Obstacle::new(Vec2::new(1400.0, 600.0), 120.0),
            Obstacle::new(Vec2::new(2600.0, 2400.0), 150.0),
            Obstacle::new(Vec2::new(4960.0, 2500.0), 60.0),
        ])
        .with_zones(vec![
            BonusZone::speed(Vec2::new(700.0, 450.0)),
            BonusZone::shelter(Vec2::new(1800.0, 1600.0)),
            BonusZone::speed(Vec2::new(3200.0, 3000.0)),
        ])
        .with_dens(vec![Den::new(Vec2::new(2500.0, 4000.0))])
}

fn input_for(tick: u64) -> TickInput {
    TickInput {
        luring: tick % 3 != 0,
        scatter: tick == 40,
        recall: tick == 55,
    }
}

fn assert_inside(sim: &SimulationState) {
    let extent = sim.terrain().extent();
    for agent in sim.agents() {
        let p = agent.position();
        assert!(
            (0.0..=extent).contains(&p.x) && (0.0..=extent).contains(&p.y),
            "{:?} left the world at {:?} on tick {}",
            agent.kind(),
            p,
            sim.tick_count()
        );
    }
}

/// INVARIANT: A session is reproducible from its seed
#[test]
fn invariant_same_seed_same_session() {
    let mut a = SimulationState::new(busy_config(42)).unwrap();
    let mut b = SimulationState::new(busy_config(42)).unwrap();

    for tick in 1..=120 {
        if tick == 30 {
            a.set_weather(Weather::Storm);
            b.set_weather(Weather::Storm);
        }
        let input = input_for(tick);
        let ea = a.tick(&input);
        let eb = b.tick(&input);
        match (ea, eb) {
            (Ok(ea), Ok(eb)) => assert_eq!(ea, eb),
            (Err(_), Err(_)) => break,
            _ => panic!("sessions diverged on tick {}", tick),
        }
    }
    assert_eq!(a.snapshot(), b.snapshot());

    let fresh = SimulationState::new(busy_config(42)).unwrap();
    let other = SimulationState::new(busy_config(43)).unwrap();
    assert_ne!(fresh.predators(), other.predators());
}

/// INVARIANT: No agent ever leaves the world square
#[test]
fn invariant_agents_stay_in_world() {
    for seed in [1, 2, 3] {
        let mut sim = SimulationState::new(busy_config(seed)).unwrap();
        sim.set_weather(Weather::Wind);
        assert_inside(&sim);

        for tick in 1..=200 {
            if sim.tick(&input_for(tick)).is_err() {
                break;
            }
            assert_inside(&sim);
            if sim.outcome().is_some() {
                break;
            }
        }
    }
}

/// INVARIANT: Scatter and recall never create or destroy followers, and
/// keep the recruited subset
#[test]
fn invariant_scatter_recall_conserves_flock() {
    let config = SessionConfig::default()
        .with_predator_count(0)
        .with_initial_flock(200)
        .with_seed(8)
        .with_zones(vec![BonusZone::speed(Vec2::new(300.0, 300.0))]);
    let mut sim = SimulationState::new(config).unwrap();

    for _ in 0..20 {
        sim.tick(&TickInput::luring()).unwrap();
    }
    let total = sim.followers().len();
    let recruited = sim.recruited_count();
    assert!(recruited >= 50);

    for round in 0..3 {
        let events = sim
            .tick(&TickInput {
                scatter: true,
                ..Default::default()
            })
            .unwrap();
        assert!(events.contains(&SimEvent::FlockScattered), "round {}", round);
        assert_eq!(sim.followers().len(), total);

        for _ in 0..5 {
            sim.tick(&TickInput::default()).unwrap();
        }

        let events = sim
            .tick(&TickInput {
                recall: true,
                ..Default::default()
            })
            .unwrap();
        assert!(events.contains(&SimEvent::FlockRecalled { recruited }));
        assert_eq!(sim.followers().len(), total);
        assert_eq!(sim.recruited_count(), recruited);
    }
}

/// INVARIANT: Composed routes never repeat a point at a segment join
#[test]
fn invariant_route_joins_are_deduplicated() {
    let terrain = Terrain::new(
        NavSettings::default(),
        vec![Obstacle::new(Vec2::new(1000.0, 1000.0), 80.0)],
    );
    let start = Vec2::new(300.0, 300.0);
    let goal = Vec2::new(4600.0, 4600.0);
    let objectives = [
        Objective::from_zone(&BonusZone::speed(Vec2::new(1500.0, 700.0))),
        Objective::from_waypoint(&Waypoint::new(Vec2::new(2500.0, 2900.0))),
        Objective::from_waypoint(&Waypoint::new(start)),
        Objective::from_zone(&BonusZone::speed(Vec2::new(4000.0, 3500.0))),
    ];

    let composition = compose_route(
        &Pathfinder::default(),
        terrain.grid(),
        start,
        goal,
        &objectives,
        terrain.extent(),
        1.5,
    );
    let points = composition.route.points();
    assert!(points.len() > 10);
    assert_eq!(composition.route.destination(), Some(goal));
    for pair in points.windows(2) {
        assert!(
            pair[0].distance(pair[1]) >= JOIN_EPSILON,
            "duplicate join at {:?}",
            pair[0]
        );
    }
}

/// INVARIANT: Every path point before the requested end lies on a walkable
/// cell, outside every obstacle
#[test]
fn invariant_paths_respect_walkability() {
    let obstacles = vec![
        Obstacle::new(Vec2::new(1000.0, 1000.0), 80.0),
        Obstacle::new(Vec2::new(2500.0, 2500.0), 300.0),
        Obstacle::new(Vec2::new(1200.0, 3800.0), 150.0),
        Obstacle::new(Vec2::new(3900.0, 1300.0), 200.0),
    ];
    let terrain = Terrain::new(NavSettings::default(), obstacles);
    let grid = terrain.grid();
    let finder = Pathfinder::default();
    let mut rng = StdRng::seed_from_u64(21);

    let mut found = 0;
    for _ in 0..40 {
        let start = Vec2::new(rng.gen_range(0.0..5000.0), rng.gen_range(0.0..5000.0));
        let end = Vec2::new(rng.gen_range(0.0..5000.0), rng.gen_range(0.0..5000.0));
        let outcome = finder.find_path(grid, start, end);
        let points = outcome.points();
        if points.is_empty() {
            continue;
        }
        found += 1;
        assert_eq!(*points.last().unwrap(), end);
        for &p in &points[..points.len() - 1] {
            assert!(grid.is_walkable(grid.cell_at(p)), "{:?} is not walkable", p);
            for o in terrain.obstacles() {
                assert!(!o.blocks(p, 0.0), "{:?} lies inside {:?}", p, o);
            }
        }
    }
    assert!(found > 20);
}

/// INVARIANT: An enclosed goal is reported unreachable, never searched
/// forever
#[test]
fn invariant_enclosed_goal_is_unreachable() {
    let mut grid = WalkabilityGrid::open(5000.0, 60.0);
    let goal = GridCoord::new(40, 40);
    for dc in -2..=2 {
        for dr in -2..=2 {
            if dc == -2 || dc == 2 || dr == -2 || dr == 2 {
                grid.set_walkable(goal.offset(dc, dr), false);
            }
        }
    }

    let start = Vec2::new(100.0, 100.0);
    let end = grid.center(goal);
    assert_eq!(
        Pathfinder::default().find_path(&grid, start, end),
        PathOutcome::Unreachable
    );
    // With a tiny cap the same request is only exhausted, which is retryable
    let capped = Pathfinder::new(50).find_path(&grid, start, end);
    assert_eq!(capped, PathOutcome::Exhausted);
    assert!(capped.is_retryable());
}

/// INVARIANT: On an open grid every path has octile length
#[test]
fn invariant_open_grid_paths_are_shortest() {
    let grid = WalkabilityGrid::open(1260.0, 60.0);
    let finder = Pathfinder::default();
    let start = GridCoord::new(10, 10);

    for col in 0..grid.cols() as i32 {
        for row in 0..grid.rows() as i32 {
            let goal = GridCoord::new(col, row);
            if goal == start {
                continue;
            }
            let cells = finder.find_cell_path(&grid, start, goal).unwrap();
            assert_eq!(*cells.last().unwrap(), goal);

            let mut prev = start;
            let mut cost = 0.0;
            for &c in &cells {
                cost += if c.col != prev.col && c.row != prev.row {
                    SQRT_2
                } else {
                    1.0
                };
                prev = c;
            }
            let dx = (goal.col - start.col).abs() as f32;
            let dy = (goal.row - start.row).abs() as f32;
            let octile = dx.max(dy) - dx.min(dy) + dx.min(dy) * SQRT_2;
            assert!(
                (cost - octile).abs() < 1e-3,
                "{:?}: cost {} vs octile {}",
                goal,
                cost,
                octile
            );
        }
    }
}
