use serde::{Deserialize, Serialize};
use std::fmt;

/// Session identifier as reported by the host in scoring updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Testday,
    P1,
    P2,
    P3,
    P4,
    Q1,
    Q2,
    Q3,
    Q4,
    Warmup,
    R1,
    R2,
    R3,
    R4,
}

impl SessionType {
    const ALL: [SessionType; 14] = [
        SessionType::Testday,
        SessionType::P1,
        SessionType::P2,
        SessionType::P3,
        SessionType::P4,
        SessionType::Q1,
        SessionType::Q2,
        SessionType::Q3,
        SessionType::Q4,
        SessionType::Warmup,
        SessionType::R1,
        SessionType::R2,
        SessionType::R3,
        SessionType::R4,
    ];

    /// Maps the host's numeric session code; unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Testday => "testday",
            SessionType::P1 => "p1",
            SessionType::P2 => "p2",
            SessionType::P3 => "p3",
            SessionType::P4 => "p4",
            SessionType::Q1 => "q1",
            SessionType::Q2 => "q2",
            SessionType::Q3 => "q3",
            SessionType::Q4 => "q4",
            SessionType::Warmup => "warmup",
            SessionType::R1 => "r1",
            SessionType::R2 => "r2",
            SessionType::R3 => "r3",
            SessionType::R4 => "r4",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
