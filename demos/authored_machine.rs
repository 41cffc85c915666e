//! Authored Machine
//!
//! This demo compiles a machine from a JSON authoring record.
//!
//! Key concepts:
//! - Registering state kinds with `state_kind!`
//! - Kind parameters deserialized from the record
//! - Weighted completion transitions with a seeded RNG
//! - States requesting a specific successor
//!
//! Run with: RUST_LOG=info cargo run --example authored_machine

use serde::Deserialize;
use std::cell::Cell;
use std::rc::Rc;
use tickstate::authoring::AuthoringRecord;
use tickstate::core::{State, StateContext};
use tickstate::{state_kind, MachineBuilder, StateRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Villager {
    hunger: Cell<u32>,
}

#[derive(Default, Deserialize)]
struct Work {
    #[serde(default = "default_shift")]
    shift: u32,
    #[serde(skip)]
    elapsed: u32,
}

fn default_shift() -> u32 {
    3
}

impl State<Villager> for Work {
    fn on_enter(&mut self, _ctx: &StateContext<'_, Villager>) {
        self.elapsed = 0;
    }

    fn on_update(&mut self, ctx: &StateContext<'_, Villager>) {
        if let Some(villager) = ctx.entity() {
            villager.hunger.set(villager.hunger.get() + 1);
        }
        self.elapsed += 1;
        if self.elapsed >= self.shift {
            ctx.complete();
        }
    }
}

#[derive(Default, Deserialize)]
struct Eat {
    #[serde(default)]
    then: Option<String>,
}

impl State<Villager> for Eat {
    fn on_update(&mut self, ctx: &StateContext<'_, Villager>) {
        if let Some(villager) = ctx.entity() {
            villager.hunger.set(0);
        }
        match &self.then {
            Some(id) => ctx.request_state(id.clone()),
            None => ctx.complete(),
        }
    }
}

#[derive(Default, Deserialize)]
struct Chat;

impl State<Villager> for Chat {
    fn on_update(&mut self, ctx: &StateContext<'_, Villager>) {
        ctx.complete();
    }
}

state_kind!(Work => Villager, group = "Daily");
state_kind!(Eat => Villager, group = "Daily", requires = ["Work"]);
state_kind!(Chat => Villager, group = "Social");

const RECORD: &str = r#"{
    "states": [
        { "type": "Work", "params": { "shift": 2 } },
        { "type": "Eat", "id": "lunch", "params": { "then": "Work" } },
        { "type": "Chat", "tag": "social" }
    ],
    "transitions": [
        { "from": "Work", "to": "Chat", "probability": 0.3 },
        { "from": "Work", "to": "lunch" },
        { "from": "Any", "to": "Work" }
    ]
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Authored Machine ===\n");

    let mut registry = StateRegistry::new();
    registry
        .register::<Work>()
        .register::<Eat>()
        .register::<Chat>();

    for (group, kinds) in registry.groups() {
        println!("{group}: {}", kinds.join(", "));
    }

    let record = AuthoringRecord::from_json(RECORD).unwrap();
    let villager = Rc::new(Villager::default());
    let mut machine = MachineBuilder::new()
        .record(record)
        .entity(Rc::clone(&villager))
        .seed(2024)
        .build_with(&registry)
        .unwrap();

    println!();
    for tick in 1..=12 {
        machine.update();
        println!(
            "tick {tick:>2}: {:<6} hunger {}",
            machine.state_id().unwrap_or("-"),
            villager.hunger.get()
        );
    }

    println!("\nTransitions kept: {}", machine.history().len());
    println!("\n=== Demo Complete ===");
}
