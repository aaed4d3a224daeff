//! Skills - active abilities resolved from the content catalog.
//!
//! Effect values combine a flat base with attribute scaling, then grow 10%
//! per trained skill level past the first.

use serde::{Deserialize, Serialize};

use crate::entities::character::StatBlock;
use crate::ids::SkillId;

/// Attribute an effect scales from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingStat {
    Strength,
    Intelligence,
    Dexterity,
    Vitality,
}

/// What an effect does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillEffectKind {
    Damage,
    Heal,
}

/// Attribute scaling attached to an effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectScaling {
    pub stat: ScalingStat,
    pub ratio: f64,
}

/// One effect line of a skill definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEffect {
    pub kind: SkillEffectKind,
    pub base: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<EffectScaling>,
}

/// An active skill from the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub mana_cost: i32,
    pub level_required: u32,
    pub effects: Vec<SkillEffect>,
}

/// A computed effect value ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillOutcome {
    pub kind: SkillEffectKind,
    pub value: i32,
}

impl Skill {
    /// Compute each effect for a caster's attributes at a trained level.
    pub fn effects_for(&self, stats: &StatBlock, skill_level: u32) -> Vec<SkillOutcome> {
        self.effects
            .iter()
            .map(|effect| {
                let mut value = f64::from(effect.base);
                if let Some(scaling) = &effect.scaling {
                    value += f64::from(stat_value(stats, scaling.stat)) * scaling.ratio;
                }
                value *= 1.0 + f64::from(skill_level.saturating_sub(1)) * 0.1;
                SkillOutcome {
                    kind: effect.kind,
                    value: value.floor() as i32,
                }
            })
            .collect()
    }
}

fn stat_value(stats: &StatBlock, stat: ScalingStat) -> i32 {
    match stat {
        ScalingStat::Strength => stats.strength,
        ScalingStat::Intelligence => stats.intelligence,
        ScalingStat::Dexterity => stats.dexterity,
        ScalingStat::Vitality => stats.vitality,
    }
}
