//! Shared types for the proctor API

use proctor_util::{ProctorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kind of violation the dispatch engine tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    NoFace,
    MultipleFaces,
    FullscreenExit,
    TabSwitch,
    CopyPasteAttempt,
    MultipleScreens,
}

impl ViolationType {
    /// Every violation type, in declaration order
    pub const ALL: [ViolationType; 6] = [
        ViolationType::NoFace,
        ViolationType::MultipleFaces,
        ViolationType::FullscreenExit,
        ViolationType::TabSwitch,
        ViolationType::CopyPasteAttempt,
        ViolationType::MultipleScreens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::NoFace => "NO_FACE",
            ViolationType::MultipleFaces => "MULTIPLE_FACES",
            ViolationType::FullscreenExit => "FULLSCREEN_EXIT",
            ViolationType::TabSwitch => "TAB_SWITCH",
            ViolationType::CopyPasteAttempt => "COPY_PASTE_ATTEMPT",
            ViolationType::MultipleScreens => "MULTIPLE_SCREENS",
        }
    }

    /// The check that produces this violation
    pub fn check(&self) -> CheckKind {
        match self {
            ViolationType::NoFace | ViolationType::MultipleFaces => CheckKind::FaceDetection,
            ViolationType::FullscreenExit => CheckKind::Fullscreen,
            ViolationType::TabSwitch => CheckKind::TabSwitch,
            ViolationType::CopyPasteAttempt => CheckKind::CopyPaste,
            ViolationType::MultipleScreens => CheckKind::MultipleScreens,
        }
    }

    /// Recommended throttle window for this type
    pub fn default_throttle(&self) -> Duration {
        let ms = match self {
            ViolationType::NoFace => 5000,
            ViolationType::MultipleFaces => 5000,
            ViolationType::FullscreenExit => 3000,
            ViolationType::TabSwitch => 0,
            ViolationType::CopyPasteAttempt => 2000,
            ViolationType::MultipleScreens => 10000,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ViolationType {
    type Err = ProctorError;

    fn from_str(s: &str) -> Result<Self> {
        ViolationType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProctorError::validation(format!("Unknown violation type: {}", s)))
    }
}

/// Free-form details attached to an observation and echoed in its event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationDetails(Map<String, Value>);

impl ViolationDetails {
    pub const COUNT: &'static str = "count";
    pub const EVENT_TYPE: &'static str = "eventType";

    pub fn new() -> Self {
        Self::default()
    }

    /// Details carrying a face count
    pub fn with_count(count: usize) -> Self {
        let mut details = Self::new();
        details.insert(Self::COUNT, Value::from(count as u64));
        details
    }

    /// Details carrying a clipboard event subtype
    pub fn with_event_type(event_type: impl Into<String>) -> Self {
        let mut details = Self::new();
        details.insert(Self::EVENT_TYPE, Value::String(event_type.into()));
        details
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn count(&self) -> Option<u64> {
        self.get(Self::COUNT).and_then(Value::as_u64)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.get(Self::EVENT_TYPE).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-type throttle windows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleTable {
    durations: HashMap<ViolationType, Duration>,
}

impl ThrottleTable {
    /// No throttling for any type
    pub fn zero() -> Self {
        Self {
            durations: HashMap::new(),
        }
    }

    /// The recommended windows for every type
    pub fn recommended() -> Self {
        Self {
            durations: ViolationType::ALL
                .into_iter()
                .map(|t| (t, t.default_throttle()))
                .collect(),
        }
    }

    /// Build a table from raw millisecond values.
    ///
    /// Types missing from `millis` get no throttling. Fails if any value is
    /// negative.
    pub fn from_millis<I>(millis: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ViolationType, i64)>,
    {
        let mut table = Self::zero();
        for (kind, ms) in millis {
            let ms = u64::try_from(ms).map_err(|_| {
                ProctorError::config(format!(
                    "Throttle duration for {} must be non-negative, got {}ms",
                    kind, ms
                ))
            })?;
            table.set(kind, Duration::from_millis(ms));
        }
        Ok(table)
    }

    pub fn set(&mut self, kind: ViolationType, duration: Duration) {
        self.durations.insert(kind, duration);
    }

    /// Throttle window for `kind`, zero when unspecified
    pub fn get(&self, kind: ViolationType) -> Duration {
        self.durations.get(&kind).copied().unwrap_or(Duration::ZERO)
    }
}

impl Default for ThrottleTable {
    fn default() -> Self {
        Self::recommended()
    }
}

/// Monitoring check that can be switched on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    FaceDetection,
    Fullscreen,
    TabSwitch,
    CopyPaste,
    MultipleScreens,
}

impl CheckKind {
    pub const ALL: [CheckKind; 5] = [
        CheckKind::FaceDetection,
        CheckKind::Fullscreen,
        CheckKind::TabSwitch,
        CheckKind::CopyPaste,
        CheckKind::MultipleScreens,
    ];
}

/// Which checks a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledChecks {
    pub face_detection: bool,
    pub fullscreen: bool,
    pub tab_switch: bool,
    pub copy_paste: bool,
    pub multiple_screens: bool,
}

impl EnabledChecks {
    pub fn all() -> Self {
        Self {
            face_detection: true,
            fullscreen: true,
            tab_switch: true,
            copy_paste: true,
            multiple_screens: true,
        }
    }

    pub fn is_enabled(&self, check: CheckKind) -> bool {
        match check {
            CheckKind::FaceDetection => self.face_detection,
            CheckKind::Fullscreen => self.fullscreen,
            CheckKind::TabSwitch => self.tab_switch,
            CheckKind::CopyPaste => self.copy_paste,
            CheckKind::MultipleScreens => self.multiple_screens,
        }
    }

    pub fn set(&mut self, check: CheckKind, enabled: bool) {
        match check {
            CheckKind::FaceDetection => self.face_detection = enabled,
            CheckKind::Fullscreen => self.fullscreen = enabled,
            CheckKind::TabSwitch => self.tab_switch = enabled,
            CheckKind::CopyPaste => self.copy_paste = enabled,
            CheckKind::MultipleScreens => self.multiple_screens = enabled,
        }
    }

    /// True if any environment (non-camera) check is on
    pub fn any_environment(&self) -> bool {
        self.fullscreen || self.tab_switch || self.copy_paste || self.multiple_screens
    }
}

impl Default for EnabledChecks {
    fn default() -> Self {
        Self::all()
    }
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
    Destroyed,
}

/// Status report delivered to the host's status sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: SessionStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: SessionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
