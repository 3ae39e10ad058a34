//! Basic usage example for reweave-core
//!
//! This example demonstrates:
//! - Describing a record type with a member enumeration and a schema
//! - Wiring builders into a cycle, including one deferred value
//! - Building the instance graph and validating it
//! - Inspecting the resulting validation record
//!
//! Run with: cargo run --example basic_usage

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reweave_core::{
    builder::{BuildEngine, Builder, ValueSource},
    config::EngineConfig,
    record::{Instance, Member, Record, Schema},
    validation::{Diagnostic, RuleSet, Validator},
    ReweaveError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum CityMember {
    Name,
    Population,
    Twin,
}

impl Member for CityMember {
    const ALL: &'static [Self] = &[CityMember::Name, CityMember::Population, CityMember::Twin];

    fn name(&self) -> &'static str {
        match self {
            CityMember::Name => "name",
            CityMember::Population => "population",
            CityMember::Twin => "twin",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CityValue {
    Name(String),
    Population(i64),
}

impl From<&str> for CityValue {
    fn from(value: &str) -> Self {
        CityValue::Name(value.to_string())
    }
}

impl From<i64> for CityValue {
    fn from(value: i64) -> Self {
        CityValue::Population(value)
    }
}

#[derive(Default)]
struct City {
    name: String,
    population: i64,
    twin: Option<Instance<City>>,
}

fn mismatch(member: CityMember, expected: &str) -> ReweaveError {
    ReweaveError::MemberKind {
        record: "City".to_string(),
        member: member.name().to_string(),
        expected: expected.to_string(),
    }
}

static CITY_SCHEMA: Lazy<Schema<City>> = Lazy::new(|| {
    Schema::<City>::builder("City")
        .scalar(
            CityMember::Name,
            |city, value| match value {
                CityValue::Name(name) => {
                    city.name = name;
                    Ok(())
                }
                _ => Err(mismatch(CityMember::Name, "name")),
            },
            |city| Some(CityValue::Name(city.name.clone())),
        )
        .scalar(
            CityMember::Population,
            |city, value| match value {
                CityValue::Population(population) => {
                    city.population = population;
                    Ok(())
                }
                _ => Err(mismatch(CityMember::Population, "population")),
            },
            |city| Some(CityValue::Population(city.population)),
        )
        .nested(
            CityMember::Twin,
            |city, twin| city.twin = twin,
            |city| city.twin.clone(),
        )
        .finish()
});

impl Record for City {
    type Member = CityMember;
    type Value = CityValue;

    fn schema() -> &'static Schema<Self> {
        &CITY_SCHEMA
    }
}

/// Stands in for a census lookup that completes asynchronously.
struct Census(i64);

#[async_trait(?Send)]
impl ValueSource<City> for Census {
    async fn resolve(&self, _member: CityMember) -> Result<CityValue, ReweaveError> {
        tokio::task::yield_now().await;
        Ok(CityValue::Population(self.0))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ReweaveError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== reweave Basic Usage Example ===\n");

    // 1. Describe two twinned cities. The twin links form a cycle.
    println!("1. Wiring builders...");
    let lyon = Builder::<City>::new()
        .with_value(CityMember::Name, "Lyon")
        .with_deferred(CityMember::Population, Census(522_000));
    let birmingham = Builder::<City>::new()
        .with_value(CityMember::Name, "")
        .with_value(CityMember::Population, -1);
    lyon.set_nested(CityMember::Twin, &birmingham);
    birmingham.set_nested(CityMember::Twin, &lyon);

    // 2. Build the instance graph.
    println!("2. Building...");
    let config = EngineConfig::from_toml_str("max_depth = 32\nyield_interval = 8")?;
    let engine = BuildEngine::new(config.clone());
    let city = engine.build(&lyon).await?;
    let twin = city
        .nested(CityMember::Twin)?
        .ok_or_else(|| ReweaveError::Config("twin missing".to_string()))?;
    let back = twin
        .nested(CityMember::Twin)?
        .ok_or_else(|| ReweaveError::Config("twin missing".to_string()))?;
    println!(
        "   ✓ {} ({} inhabitants) is twinned back to itself: {}\n",
        city.borrow().name,
        city.borrow().population,
        back.ptr_eq(&city)
    );

    // 3. Validate.
    println!("3. Validating...");
    let rules = RuleSet::<City>::new()
        .predicate(
            CityMember::Name,
            Diagnostic::code("blank_name", "a city needs a name"),
            |value| matches!(value, CityValue::Name(name) if !name.is_empty()),
        )
        .predicate(
            CityMember::Population,
            Diagnostic::message("population must not be negative"),
            |value| matches!(value, CityValue::Population(p) if *p >= 0),
        );
    let record = Validator::new(rules).with_config(config).validate(&city).await?;
    println!("   valid: {}", record.is_valid());
    for (path, finding) in record.flatten() {
        println!("   - {path}: {} (value: {:?})", finding.diagnostic(), finding.value());
    }

    // Break the reference cycles so the graphs are released.
    lyon.clear(CityMember::Twin);
    birmingham.clear(CityMember::Twin);
    city.borrow_mut().twin = None;
    twin.borrow_mut().twin = None;

    println!("\n=== Example Complete ===");
    Ok(())
}
