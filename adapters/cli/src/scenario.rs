//! TOML scenario describing a headless barrage run.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use barrage_core::{Command, KindCatalog, ProjectileKind, TargetGeometry};
use barrage_system_spawner::SpawnerConfig;
use barrage_system_target::DamageTuning;
use barrage_world::WorldConfig;
use glam::{Quat, Vec3};
use serde::Deserialize;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Parsed scenario file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    version: u32,
    #[serde(default)]
    pub(crate) seed: u64,
    #[serde(default = "default_ticks")]
    pub(crate) ticks: u32,
    #[serde(default = "default_dt_ms")]
    pub(crate) dt_ms: u64,
    #[serde(default)]
    spawner: SpawnerConfig,
    #[serde(default)]
    spawner_position: [f32; 3],
    #[serde(default)]
    damage: DamageTuning,
    #[serde(default)]
    kinds: Vec<ProjectileKind>,
    #[serde(default)]
    target: Option<TargetSection>,
    #[serde(default)]
    pub(crate) volleys: Vec<Volley>,
    #[serde(default)]
    random_batches: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSection {
    position: [f32; 3],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
    #[serde(default)]
    vertices: Vec<[f32; 3]>,
}

/// Projectiles requested at the start of the run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Volley {
    /// Number of projectiles to queue.
    pub(crate) amount: i32,
    /// Kind name, or `None` for a random pick.
    #[serde(default)]
    pub(crate) kind: Option<String>,
}

const fn default_ticks() -> u32 {
    600
}

const fn default_dt_ms() -> u64 {
    16
}

const fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Scenario {
    /// Returns the default scenario path relative to the repository root.
    #[must_use]
    pub(crate) fn default_path() -> PathBuf {
        PathBuf::from("assets/scenario.toml")
    }

    /// Reads and parses the scenario at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Parses scenario text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if scenario.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                scenario.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }
        if scenario.dt_ms == 0 {
            bail!("scenario dt_ms must be positive");
        }
        Ok(scenario)
    }

    /// Builds the world settings described by the scenario.
    #[must_use]
    pub(crate) fn world_config(&self) -> WorldConfig {
        WorldConfig {
            seed: self.seed,
            spawner: self.spawner,
            spawner_position: Vec3::from_array(self.spawner_position),
            spawner_orientation: Quat::IDENTITY,
            tuning: self.damage,
            catalog: KindCatalog::new(self.kinds.clone()),
        }
    }

    /// Commands that set up the target and queue the opening volleys.
    ///
    /// Kind names are resolved against `catalog`; an unknown name is an error.
    pub(crate) fn setup_commands(&self, catalog: &KindCatalog) -> Result<Vec<Command>> {
        let mut commands = vec![Command::AssignTarget {
            geometry: self.target.as_ref().map(TargetSection::geometry),
        }];

        for volley in &self.volleys {
            let kind = match volley.kind.as_deref() {
                Some(name) => Some(
                    catalog
                        .find(name)
                        .with_context(|| format!("unknown projectile kind `{name}` in volley"))?,
                ),
                None => None,
            };
            commands.push(Command::Enqueue {
                amount: volley.amount,
                kind,
            });
        }

        if self.random_batches > 0 {
            commands.push(Command::EnqueueRandomBatches {
                batches: self.random_batches,
            });
        }
        Ok(commands)
    }
}

impl TargetSection {
    fn geometry(&self) -> TargetGeometry {
        TargetGeometry::new(
            Vec3::from_array(self.position),
            Vec3::from_array(self.scale),
            self.vertices
                .iter()
                .copied()
                .map(Vec3::from_array)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barrage_core::KindId;

    const SAMPLE: &str = r#"
        version = 1
        seed = 7
        ticks = 120

        [spawner]
        maximum_spawns = 12

        [damage]
        resistance = 5000.0

        [[kinds]]
        name = "pebble"

        [[kinds]]
        name = "brick"
        config = { weight = 40 }

        [target]
        position = [10.0, 0.0, 0.0]
        vertices = [[0.0, 1.0, 0.0], [0.0, -1.0, 0.0]]

        [[volleys]]
        amount = 3
        kind = "brick"

        [[volleys]]
        amount = 2
    "#;

    #[test]
    fn parse_fills_defaults() {
        let scenario = Scenario::parse(SAMPLE).expect("sample scenario parses");

        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.ticks, 120);
        assert_eq!(scenario.dt_ms, 16);
        assert_eq!(scenario.spawner.maximum_spawns, 12);
        assert_eq!(scenario.spawner.cooldown_period, 3.0);
        assert_eq!(scenario.damage.resistance, 5000.0);
        assert_eq!(scenario.kinds[1].config.weight, 40);
        assert_eq!(scenario.kinds[1].config.velocity, 20.0);
    }

    #[test]
    fn setup_commands_resolve_kind_names() {
        let scenario = Scenario::parse(SAMPLE).expect("sample scenario parses");
        let config = scenario.world_config();

        let commands = scenario
            .setup_commands(&config.catalog)
            .expect("kinds resolve");

        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            Command::AssignTarget { geometry: Some(_) }
        ));
        assert_eq!(
            commands[1],
            Command::Enqueue {
                amount: 3,
                kind: Some(KindId::new(1))
            }
        );
        assert_eq!(
            commands[2],
            Command::Enqueue {
                amount: 2,
                kind: None
            }
        );
    }

    #[test]
    fn unknown_kind_name_is_reported() {
        let scenario = Scenario::parse(
            r#"
            version = 1
            [[volleys]]
            amount = 1
            kind = "anvil"
            "#,
        )
        .expect("scenario parses");

        let error = scenario
            .setup_commands(&KindCatalog::default())
            .expect_err("unknown kind must fail");
        assert!(error.to_string().contains("anvil"));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let error = Scenario::parse("version = 2").expect_err("version 2 is unsupported");
        assert!(error.to_string().contains("unsupported scenario version"));
    }

    #[test]
    fn bundled_scenario_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/scenario.toml");
        let scenario = Scenario::load(path).expect("bundled scenario loads");
        assert!(!scenario.kinds.is_empty());
    }
}
