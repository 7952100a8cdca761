//! # Spawn Preparation
//!
//! Turning a preset back into placeables is a pure data transform. The host
//! creates the documents; this module only computes what to create:
//!
//! 1. **Translate**: every data object (and every attached placeable) is moved
//!    so that the preset's top-left corner lands on the requested point.
//!    Relative layout is preserved. Walls are positioned by their `c`
//!    coordinate array, everything else by `x`/`y`.
//! 2. **Add/Subtract**: numeric deltas from `addSubtract` are added to the
//!    field at each dotted path (`"elevation"`, `"flags.light.dim"`).
//! 3. **Randomize**: for each dotted path in `randomize`, one candidate value
//!    is picked per data object.
//! 4. **Hooks**: pre-spawn hooks registered for the preset's document type
//!    (or for `ALL`) run last, in registration order, and may edit the plan.
//!
//! Scripts stored on the preset (`preSpawnScript`) are carried on the plan
//! untouched; executing them is the host's business.
//!
//! Randomness is drawn from a caller-supplied [`rand::Rng`], so tests can seed
//! it.

use crate::error::{PresetError, Result};
use crate::model::{AttachedPlaceable, PresetRecord, ALL_TYPES, SUPPORTED_TYPES};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

/// Where and how to spawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnOptions {
    pub x: f64,
    pub y: f64,
    /// Overrides `elevation` on every data object when set.
    pub elevation: Option<f64>,
    /// Overrides `hidden` on every data object when set.
    pub hidden: Option<bool>,
    /// Skip the `randomize` step.
    pub skip_randomize: bool,
}

impl SpawnOptions {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// The documents to create for one spawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnPlan {
    pub preset_id: String,
    pub document_name: String,
    pub data: Vec<Value>,
    pub attached: Vec<AttachedPlaceable>,
    pub pre_spawn_script: Option<String>,
    pub post_spawn_script: Option<String>,
}

type Hook = Box<dyn Fn(&mut SpawnPlan) -> Result<()>>;

struct Registration {
    name: String,
    document_name: String,
    hook: Hook,
}

/// Pre-spawn hooks registered by extensions.
#[derive(Default)]
pub struct SpawnHookRegistry {
    hooks: Vec<Registration>,
}

impl std::fmt::Debug for SpawnHookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|r| (&r.name, &r.document_name)))
            .finish()
    }
}

impl SpawnHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook for `document_name` (or `ALL`).
    ///
    /// Fails on an empty name, an unsupported document type, or a name
    /// already registered.
    pub fn register<F>(&mut self, name: &str, document_name: &str, hook: F) -> Result<()>
    where
        F: Fn(&mut SpawnPlan) -> Result<()> + 'static,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::Validation(
                "Spawn hook name cannot be empty".into(),
            ));
        }
        if document_name != ALL_TYPES && !SUPPORTED_TYPES.contains(document_name) {
            return Err(PresetError::Validation(format!(
                "Spawn hook '{}' targets unsupported document type '{}'",
                name, document_name
            )));
        }
        if self.hooks.iter().any(|r| r.name == name) {
            return Err(PresetError::Validation(format!(
                "Spawn hook '{}' is already registered",
                name
            )));
        }
        self.hooks.push(Registration {
            name: name.to_string(),
            document_name: document_name.to_string(),
            hook: Box::new(hook),
        });
        Ok(())
    }

    /// Removes a hook; returns whether it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|r| r.name != name);
        self.hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    fn run(&self, plan: &mut SpawnPlan) -> Result<()> {
        for registration in &self.hooks {
            if registration.document_name == ALL_TYPES
                || registration.document_name == plan.document_name
            {
                tracing::debug!(hook = %registration.name, preset = %plan.preset_id, "running pre-spawn hook");
                (registration.hook)(plan)?;
            }
        }
        Ok(())
    }
}

/// Computes the documents to create for `record` at the requested position.
pub fn prepare_spawn<R: Rng + ?Sized>(
    record: &PresetRecord,
    options: &SpawnOptions,
    hooks: &SpawnHookRegistry,
    rng: &mut R,
) -> Result<SpawnPlan> {
    record.validate()?;

    let mut plan = SpawnPlan {
        preset_id: record.id.clone(),
        document_name: record.document_name.clone(),
        data: record.data.clone(),
        attached: record.attached.clone(),
        pre_spawn_script: record.pre_spawn_script.clone(),
        post_spawn_script: record.post_spawn_script.clone(),
    };

    let origin = top_left(&plan.data);
    if let Some((min_x, min_y)) = origin {
        let (dx, dy) = (options.x - min_x, options.y - min_y);
        for data in plan.data.iter_mut() {
            translate(data, dx, dy);
        }
        for attached in plan.attached.iter_mut() {
            translate(&mut attached.data, dx, dy);
        }
    }

    for data in plan.data.iter_mut() {
        if let Some(deltas) = &record.add_subtract {
            for (path, delta) in deltas {
                add_at_path(data, path, *delta);
            }
        }
        if let (Some(choices), false) = (&record.randomize, options.skip_randomize) {
            for (path, candidates) in choices {
                if let Some(choice) = candidates.choose(rng) {
                    set_at_path(data, path, choice.clone());
                }
            }
        }
        if let Some(elevation) = options.elevation {
            set_at_path(data, "elevation", Value::from(elevation));
        }
        if let Some(hidden) = options.hidden {
            set_at_path(data, "hidden", Value::Bool(hidden));
        }
    }

    hooks.run(&mut plan)?;
    Ok(plan)
}

/// Smallest x and y over every positioned data object.
pub fn top_left(data: &[Value]) -> Option<(f64, f64)> {
    let mut min: Option<(f64, f64)> = None;
    let mut include = |x: f64, y: f64| {
        min = Some(match min {
            Some((mx, my)) => (mx.min(x), my.min(y)),
            None => (x, y),
        });
    };
    for value in data {
        if let Some(coords) = wall_coords(value) {
            include(coords[0].min(coords[2]), coords[1].min(coords[3]));
        } else if let (Some(x), Some(y)) = (number(value, "x"), number(value, "y")) {
            include(x, y);
        }
    }
    min
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn wall_coords(value: &Value) -> Option<[f64; 4]> {
    let c = value.get("c")?.as_array()?;
    if c.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, v) in out.iter_mut().zip(c) {
        *slot = v.as_f64()?;
    }
    Some(out)
}

fn translate(value: &mut Value, dx: f64, dy: f64) {
    if let Some([x1, y1, x2, y2]) = wall_coords(value) {
        value["c"] = Value::from(vec![x1 + dx, y1 + dy, x2 + dx, y2 + dy]);
        return;
    }
    if let (Some(x), Some(y)) = (number(value, "x"), number(value, "y")) {
        value["x"] = Value::from(x + dx);
        value["y"] = Value::from(y + dy);
    }
}

/// Adds `delta` to the number at `path`; non-numeric or missing fields are left alone.
fn add_at_path(value: &mut Value, path: &str, delta: f64) {
    let target = path
        .split('.')
        .try_fold(value, |current, key| current.get_mut(key));
    match target {
        Some(slot) if slot.is_number() => {
            let current = slot.as_f64().unwrap_or_default();
            *slot = Value::from(current + delta);
        }
        _ => tracing::debug!(path = %path, "addSubtract target is not a number, skipping"),
    }
}

/// Writes `new` at `path`, creating intermediate objects.
fn set_at_path(value: &mut Value, path: &str, new: Value) {
    let mut current = value;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        if keys.peek().is_none() {
            map.insert(key.to_string(), new);
            return;
        }
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
}
