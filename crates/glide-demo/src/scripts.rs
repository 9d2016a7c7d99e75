use anyhow::{bail, Result};

/// Demo scripts selectable with `--script=<name>` or `DEMO_SCRIPT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Toggle,
    Keyframes,
    Group,
}

impl Script {
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "toggle" => Self::Toggle,
            "keyframes" => Self::Keyframes,
            "group" => Self::Group,
            other => bail!("unknown script {other:?} (expected toggle, keyframes or group)"),
        })
    }
}
