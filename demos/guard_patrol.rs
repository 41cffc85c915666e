//! Guard Patrol
//!
//! This demo drives a hand-built machine for a castle guard.
//!
//! Key concepts:
//! - Conditional transitions polled every tick
//! - Completion transitions raised from inside a state
//! - Wildcard transitions as a fallback
//! - Guards vetoing entry into a state
//!
//! Run with: RUST_LOG=info cargo run --example guard_patrol

use std::cell::Cell;
use std::rc::Rc;
use tickstate::core::{State, StateContext};
use tickstate::{Machine, MachineConfig, Origin};
use tracing_subscriber::EnvFilter;

struct Guard {
    stamina: Cell<u32>,
    intruder_seen: Cell<bool>,
}

/// Walks the walls until tired.
struct Patrol;

impl State<Guard> for Patrol {
    fn on_update(&mut self, ctx: &StateContext<'_, Guard>) {
        let Some(guard) = ctx.entity() else {
            return;
        };
        let left = guard.stamina.get().saturating_sub(3);
        guard.stamina.set(left);
        println!("  patrolling, stamina {left}");
        if left == 0 {
            ctx.complete();
        }
    }
}

/// Regains stamina, then goes back to patrolling.
struct Rest;

impl State<Guard> for Rest {
    fn on_update(&mut self, ctx: &StateContext<'_, Guard>) {
        let Some(guard) = ctx.entity() else {
            return;
        };
        guard.stamina.set(guard.stamina.get() + 4);
        println!("  resting, stamina {}", guard.stamina.get());
        if guard.stamina.get() >= 8 {
            ctx.complete();
        }
    }

    fn tag(&self) -> &str {
        "idle"
    }
}

/// Chases the intruder; only entered with stamina to spare.
struct Chase;

impl State<Guard> for Chase {
    fn on_enter(&mut self, _ctx: &StateContext<'_, Guard>) {
        println!("  intruder spotted!");
    }

    fn on_update(&mut self, ctx: &StateContext<'_, Guard>) {
        let Some(guard) = ctx.entity() else {
            return;
        };
        guard.intruder_seen.set(false);
        ctx.complete();
    }

    fn guard_check(&self, ctx: &StateContext<'_, Guard>) -> bool {
        ctx.entity().is_some_and(|guard| guard.stamina.get() > 0)
    }

    fn tag(&self) -> &str {
        "hostile"
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Guard Patrol ===\n");

    let guard = Rc::new(Guard {
        stamina: Cell::new(9),
        intruder_seen: Cell::new(false),
    });

    let mut machine = Machine::with_config(MachineConfig::default().with_label("castle_guard"));
    machine.add(Patrol, false);
    machine.add(Rest, false);
    machine.add(Chase, false);

    let watcher = Rc::clone(&guard);
    machine
        .add_conditional_transition("Patrol", "Chase", move || watcher.intruder_seen.get())
        .unwrap()
        .add_completion_transition("Patrol", "Rest")
        .unwrap()
        .add_completion_transition(Origin::Any, "Patrol")
        .unwrap();
    machine.set_entry_state("Patrol").unwrap();
    machine.init(Rc::clone(&guard));

    for tick in 1..=8 {
        if tick == 6 {
            guard.intruder_seen.set(true);
        }
        println!("tick {tick} [{}]", machine.state_id().unwrap_or("-"));
        machine.update();
    }

    println!("\nPath: {}", machine.history().get_path().join(" -> "));
    println!("Hostile now: {}", machine.compare_tag("hostile"));

    machine.dispose();
    println!("\n=== Demo Complete ===");
}
