//! Query demo: moves a handful of entities between queries.
//!
//! Defines the example components, registers them with a query manager, and
//! keeps two live queries: moving entities (`Position` and `Velocity`) and
//! stationary ones (`Position` without `Velocity`). Every membership change
//! of either query is logged.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use components::{Components, Position, VelocityData};
use glam::Vec3;
use engine_component::{
    Entity, EntityAllocator, ObservableSet, QueryResults, Registry, RegistryConfig, observer,
};

fn log_membership(query: &QueryResults) {
    let name = query.to_string();
    query
        .stream(observer(move |entity: &Entity| {
            info!(query = %name, %entity, "entered");
        }))
        .detach();
    let name = query.to_string();
    query
        .on_remove(observer(move |entity: &Entity| {
            info!(query = %name, %entity, "left");
        }))
        .detach();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("query_demo=info".parse()?))
        .init();

    let registry = Registry::new(RegistryConfig::default());
    let c = Components::define(&registry);
    let manager = registry.query_manager(c.terms());

    let moving = manager.query(&[c.position.term(), c.velocity.term()])?;
    let stationary = manager.query(&[c.position.term(), registry.not(&c.velocity)])?;
    log_membership(&moving);
    log_membership(&stationary);

    let mut alloc = EntityAllocator::new();
    let rock = alloc.allocate();
    let ship = alloc.allocate();

    c.position.add(&rock)?;
    c.position.add(&ship)?;
    c.sprite.add(&ship)?;
    c.velocity
        .add_with(&ship, VelocityData { x: 1.0, y: 0.0, z: 0.5 })?;

    if let Some(mut position) = ship.get_mut::<Position>() {
        position.value = Vec3::new(4.0, 0.0, -2.0);
    }

    let snapshot = serde_json::to_string(&c.velocity.serialize(&ship))?;
    info!(entity = %ship, velocity = %snapshot, "serialized");
    if let Some(position) = ship.get::<Position>() {
        let snapshot = serde_json::to_string(&*position)?;
        info!(entity = %ship, position = %snapshot, "serialized");
    }

    c.velocity.remove(&ship);
    c.position.remove(&rock);

    info!(
        moving = moving.len(),
        stationary = stationary.len(),
        "final membership"
    );
    Ok(())
}
