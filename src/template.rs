//! Scene templates with `{name}` substitution slots.
//!
//! The template is parsed once into literal and slot segments, then rendered
//! per frame. Rendering is strict: every slot needs a value and every value
//! must name a slot.

use crate::{
    error::{HeroError, HeroResult},
    params::FrameParams,
};

const HERO_SCENE: &str = include_str!("../assets/git-worktrees-hero.svg");

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

#[derive(Clone, Debug)]
pub struct SceneTemplate {
    segments: Vec<Segment>,
}

impl SceneTemplate {
    pub fn parse(text: &str) -> HeroResult<Self> {
        let mut segments = Vec::new();
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            if let Some(close) = rest[..open].find('}') {
                return Err(HeroError::template(format!(
                    "unmatched '}}' at byte {}",
                    text.len() - rest.len() + close
                )));
            }
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                HeroError::template(format!(
                    "unterminated slot at byte {}",
                    text.len() - rest.len() + open
                ))
            })?;
            let name = &after[..close];
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(HeroError::template(format!("invalid slot name '{name}'")));
            }
            segments.push(Segment::Slot(name.to_string()));
            rest = &after[close + 1..];
        }

        if rest.contains('}') {
            return Err(HeroError::template("unmatched '}' after last slot"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// The worktree hero scene: three progress bars (`w1`..`w3`) and a pulsing dot (`p1`).
    pub fn hero() -> HeroResult<Self> {
        Self::parse(HERO_SCENE)
    }

    /// Distinct slot names in order of first appearance.
    pub fn slot_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if let Segment::Slot(name) = seg
                && !names.contains(&name.as_str())
            {
                names.push(name);
            }
        }
        names
    }

    pub fn render<K, V>(&self, values: &[(K, V)]) -> HeroResult<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let slot_names = self.slot_names();
        for (key, _) in values {
            if !slot_names.contains(&key.as_ref()) {
                return Err(HeroError::template(format!(
                    "value for unknown slot '{}'",
                    key.as_ref()
                )));
            }
        }

        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Slot(name) => {
                    let value = values
                        .iter()
                        .find(|(k, _)| k.as_ref() == name.as_str())
                        .ok_or_else(|| HeroError::template(format!("no value for slot '{name}'")))?;
                    out.push_str(value.1.as_ref());
                }
            }
        }
        Ok(out)
    }

    pub fn render_frame(&self, params: &FrameParams) -> HeroResult<String> {
        self.render(&params.slots())
    }
}
