use serde::{Deserialize, Serialize};

/// Size of one scratchpad argument slot in bytes.
pub const SLOT_BYTES: u64 = 8;

/// A kernel launch argument.
///
/// Argument `i` is placed at byte offset `8 * i` of the scratchpad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    Address(u64),
    Scalar(i64),
    Float32(f32),
}

#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArgumentKind {
    Address,
    Scalar,
    Float32,
}

impl Argument {
    #[must_use]
    pub fn kind(&self) -> ArgumentKind {
        match self {
            Self::Address(_) => ArgumentKind::Address,
            Self::Scalar(_) => ArgumentKind::Scalar,
            Self::Float32(_) => ArgumentKind::Float32,
        }
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32(_))
    }

    /// Moves the argument by `times * offset`.
    ///
    /// Integer arithmetic wraps, matching the 64-bit registers that read the slot.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    pub fn shifted(self, offset: i64, times: u64) -> Self {
        let delta = offset.wrapping_mul(times as i64);
        match self {
            Self::Address(addr) => Self::Address(addr.wrapping_add_signed(delta)),
            Self::Scalar(value) => Self::Scalar(value.wrapping_add(delta)),
            Self::Float32(value) => Self::Float32(value + delta as f32),
        }
    }

    /// Reinterprets the raw slot value as an argument of `kind`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn reinterpret(self, kind: ArgumentKind) -> Self {
        match (self, kind) {
            (Self::Address(raw), ArgumentKind::Scalar) => Self::Scalar(raw as i64),
            (Self::Scalar(raw), ArgumentKind::Address) => Self::Address(raw as u64),
            (arg, _) => arg,
        }
    }
}

impl From<u64> for Argument {
    fn from(addr: u64) -> Self {
        Self::Address(addr)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Self::Scalar(value)
    }
}

impl From<f32> for Argument {
    fn from(value: f32) -> Self {
        Self::Float32(value)
    }
}

fn malformed(value: impl ToString, reason: &str) -> super::Error {
    super::Error::MalformedArgument {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Rounds to the nearest float32, the way parsing `"0.1"` as `f32` does.
fn float32_nearest(value: f64) -> Result<Argument, super::Error> {
    #[allow(clippy::cast_possible_truncation)]
    let narrowed = value as f32;
    if !narrowed.is_finite() {
        return Err(malformed(value, "not a finite float32"));
    }
    Ok(Argument::Float32(narrowed))
}

impl std::str::FromStr for Argument {
    type Err = super::Error;

    /// Parses `0x..` as an address, a decimal integer as a scalar
    /// and anything with a fraction or exponent as a float.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix("0x") {
            return u64::from_str_radix(hex, 16)
                .map(Self::Address)
                .map_err(|_| malformed(value, "bad hexadecimal address"));
        }
        if let Ok(scalar) = value.parse::<i64>() {
            return Ok(Self::Scalar(scalar));
        }
        match value.parse::<f32>() {
            Ok(float) if float.is_finite() => Ok(Self::Float32(float)),
            Ok(_) => Err(malformed(value, "not a finite float32")),
            Err(_) => Err(malformed(value, "neither an integer nor a float32")),
        }
    }
}

impl TryFrom<&serde_json::Value> for Argument {
    type Error = super::Error;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::Number(number) => {
                if let Some(addr) = number.as_u64() {
                    Ok(Self::Address(addr))
                } else if let Some(scalar) = number.as_i64() {
                    Ok(Self::Scalar(scalar))
                } else {
                    let float = number
                        .as_f64()
                        .ok_or_else(|| malformed(number, "not a number"))?;
                    float32_nearest(float)
                }
            }
            Value::String(text) => text.parse(),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|_| malformed(value, "unknown argument object")),
            Value::Null | Value::Bool(_) | Value::Array(_) => {
                Err(malformed(value, "neither an integer nor a float32"))
            }
        }
    }
}

/// A named scratchpad slot.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub kind: ArgumentKind,
}

/// Typed layout of the launch arguments in the scratchpad.
///
/// Instruction bodies look up slot offsets by name and launch
/// descriptors are checked against the same layout.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSchema {
    slots: Vec<Slot>,
}

impl ArgumentSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn slot(mut self, name: impl Into<String>, kind: ArgumentKind) -> Self {
        self.slots.push(Slot {
            name: name.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn address(self, name: impl Into<String>) -> Self {
        self.slot(name, ArgumentKind::Address)
    }

    #[must_use]
    pub fn scalar(self, name: impl Into<String>) -> Self {
        self.slot(name, ArgumentKind::Scalar)
    }

    #[must_use]
    pub fn float32(self, name: impl Into<String>) -> Self {
        self.slot(name, ArgumentKind::Float32)
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Result<usize, super::Error> {
        self.slots
            .iter()
            .position(|slot| slot.name == name)
            .ok_or_else(|| super::Error::UnknownSlot(name.to_string()))
    }

    /// Byte offset of the slot `name` relative to the scratchpad base.
    pub fn offset(&self, name: &str) -> Result<u64, super::Error> {
        let index = self.index_of(name)?;
        Ok(index as u64 * SLOT_BYTES)
    }

    /// Checks that `arguments` fill every slot with a value of the slot's kind.
    pub fn check(&self, arguments: &[Argument]) -> Result<(), super::Error> {
        for (i, slot) in self.slots.iter().enumerate() {
            if self.slots[..i].iter().any(|other| other.name == slot.name) {
                return Err(super::Error::SchemaMismatch {
                    reason: format!("duplicate slot {:?}", slot.name),
                });
            }
        }
        if arguments.len() != self.slots.len() {
            return Err(super::Error::SchemaMismatch {
                reason: format!(
                    "expected {} arguments, got {}",
                    self.slots.len(),
                    arguments.len()
                ),
            });
        }
        for (slot, arg) in self.slots.iter().zip(arguments) {
            if slot.kind != arg.kind() {
                return Err(super::Error::SchemaMismatch {
                    reason: format!(
                        "slot {:?} expects {}, got {:?}",
                        slot.name, slot.kind, arg
                    ),
                });
            }
        }
        Ok(())
    }

    /// Applies the slot kinds to arguments read back from a launch descriptor.
    pub fn apply(&self, arguments: Vec<Argument>) -> Result<Vec<Argument>, super::Error> {
        if arguments.len() != self.slots.len() {
            return Err(super::Error::SchemaMismatch {
                reason: format!(
                    "expected {} arguments, got {}",
                    self.slots.len(),
                    arguments.len()
                ),
            });
        }
        Ok(arguments
            .into_iter()
            .zip(&self.slots)
            .map(|(arg, slot)| arg.reinterpret(slot.kind))
            .collect())
    }
}
