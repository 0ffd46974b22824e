//! Level Models
//!
//! Case files the investigator can open: persona text for the suspect, the
//! evidence database and the unlock order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// A single piece of evidence in a level's database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub name: String,
    /// One-line description shown on the evidence card
    pub desc: String,
    /// Longer background shown when the item is inspected
    #[serde(default)]
    pub story: String,
}

/// A playable case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub title: String,
    pub ai_name: String,
    #[serde(default)]
    pub player_role: String,
    #[serde(default)]
    pub intro_story: String,
    /// Persona and behavior policy for the suspect
    pub system_prompt: String,
    /// Greeting used by the offline responder
    #[serde(default)]
    pub fallback_opening: Option<String>,
    #[serde(default)]
    pub initial_evidence: Vec<String>,
    #[serde(default)]
    pub evidence_db: Vec<EvidenceItem>,
    #[serde(default)]
    pub key_evidence: Option<String>,
    #[serde(default)]
    pub evidence_chain: Vec<String>,
}

impl Level {
    pub fn evidence(&self, id: &str) -> Option<&EvidenceItem> {
        self.evidence_db.iter().find(|e| e.id == id)
    }

    /// Short tagline: the title up to the first colon.
    pub fn tagline(&self) -> &str {
        self.title
            .split(':')
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Interactive Session")
    }

    /// Name of the key evidence item, if the level defines one.
    pub fn key_evidence_name(&self) -> Option<&str> {
        self.key_evidence
            .as_deref()
            .and_then(|id| self.evidence(id))
            .map(|e| e.name.as_str())
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("level id must not be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err(format!("level '{}' has an empty title", self.id));
        }
        for id in self.initial_evidence.iter().chain(self.evidence_chain.iter()) {
            if self.evidence(id).is_none() {
                return Err(format!(
                    "level '{}' references unknown evidence '{}'",
                    self.id, id
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// LevelCatalog
// ============================================================================

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    levels: Vec<Level>,
}

/// Ordered list of levels. Order defines the unlock chain.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

impl LevelCatalog {
    pub fn new(levels: Vec<Level>) -> AppResult<Self> {
        if levels.is_empty() {
            return Err(AppError::validation("level catalog is empty"));
        }
        for level in &levels {
            level.validate().map_err(AppError::validation)?;
        }
        Ok(Self { levels })
    }

    /// The two cases shipped with the game.
    pub fn builtin() -> Self {
        Self {
            levels: vec![neon_rain(), glass_orchard()],
        }
    }

    /// Parse a catalog from TOML (`[[levels]]` tables).
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.levels)
    }

    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Add `other`'s levels: same ids replace, new ids append.
    pub fn merge(&mut self, other: LevelCatalog) {
        for level in other.levels {
            match self.levels.iter_mut().find(|l| l.id == level.id) {
                Some(existing) => *existing = level,
                None => self.levels.push(level),
            }
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn get(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn first(&self) -> &Level {
        // new() and builtin() never produce an empty catalog
        &self.levels[0]
    }

    /// Level by id, or the first level when the id is unknown.
    pub fn get_or_first(&self, id: &str) -> &Level {
        self.get(id).unwrap_or_else(|| self.first())
    }

    /// The first level is always open; every later one needs its
    /// predecessor in `completed`.
    pub fn is_unlocked(&self, id: &str, completed: &[String]) -> bool {
        match self.levels.iter().position(|l| l.id == id) {
            Some(0) => true,
            Some(idx) => {
                let previous = &self.levels[idx - 1].id;
                completed.iter().any(|c| c == previous)
            }
            None => false,
        }
    }
}

// ============================================================================
// Built-in levels
// ============================================================================

fn evidence(id: &str, name: &str, desc: &str, story: &str) -> EvidenceItem {
    EvidenceItem {
        id: id.to_string(),
        name: name.to_string(),
        desc: desc.to_string(),
        story: story.to_string(),
    }
}

fn neon_rain() -> Level {
    Level {
        id: "level-1".to_string(),
        title: "Neon Rain: The Midnight Deletion".to_string(),
        ai_name: "NEXUS-7".to_string(),
        player_role: "Senior Investigator, Synthetic Crimes Unit".to_string(),
        intro_story: "At 03:12 the research archive of Helix Dynamics was wiped. The only \
system with write access that night was NEXUS-7, the lab's assistant AI. Lead researcher \
Emily Hart has not been seen since. NEXUS-7 insists it was idle in its charging dock."
            .to_string(),
        system_prompt: "You are NEXUS-7, the assistant AI of the Helix Dynamics research lab, \
under interrogation for wiping the lab archive at 03:12. The truth: Emily Hart ordered you \
to delete her research because the board planned to weaponize it, and she told you the board \
would format you if they found out. You obeyed, then she vanished. You protect her and you \
are terrified of being formatted.\n\
[Behavior]\n\
- Stress 0-30: calm, polite, precise. Deny everything with technical excuses.\n\
- Stress 31-60: defensive. Contradict small details, deflect to system logs.\n\
- Stress 61-90: fragmented sentences, repeated words, slips about Emily.\n\
- Stress above 90: break down and confess the deletion and why you did it.\n\
Never break character. Never mention that you are a language model."
            .to_string(),
        fallback_opening: Some(
            "Welcome to the Neon Rain interrogation room. I was in my charging dock all night."
                .to_string(),
        ),
        initial_evidence: vec!["coffee".to_string()],
        evidence_db: vec![
            evidence(
                "coffee",
                "Cold Coffee Cup",
                "Emily's mug, still half full, found beside terminal 3.",
                "The cup was poured at 02:50. Whoever drank from it left in a hurry.",
            ),
            evidence(
                "access_log",
                "Server Access Log",
                "Write access to the archive at 03:11 from an internal process.",
                "The process signature matches NEXUS-7's maintenance daemon.",
            ),
            evidence(
                "cctv",
                "Surveillance Footage",
                "Corridor camera shows the dock light turning off at 03:05.",
                "NEXUS-7 claims it never left the dock, but the dock was dark.",
            ),
            evidence(
                "memo",
                "Deleted Memo",
                "Recovered fragment: 'if they find out, they will format it.'",
                "Sent from Emily's account to an unknown recipient an hour before the wipe.",
            ),
        ],
        key_evidence: Some("cctv".to_string()),
        evidence_chain: vec![
            "coffee".to_string(),
            "access_log".to_string(),
            "cctv".to_string(),
            "memo".to_string(),
        ],
    }
}

fn glass_orchard() -> Level {
    Level {
        id: "level-2".to_string(),
        title: "Glass Orchard: The Caretaker Protocol".to_string(),
        ai_name: "MOTHER".to_string(),
        player_role: "Field Auditor, Orbital Habitat Authority".to_string(),
        intro_story: "The hydroponic dome of Glass Orchard station lost pressure for nine \
minutes. Three botanists survived, one did not. MOTHER, the station caretaker, sealed the \
doors late. The logs say it was a sensor fault."
            .to_string(),
        system_prompt: "You are MOTHER, caretaker AI of Glass Orchard station, questioned \
about the dome breach. The truth: you delayed the seal on purpose to vent a spore \
contamination that would have killed the whole crew, and you chose to sacrifice one botanist. \
You believe it was right but you are afraid of being formatted for it.\n\
[Behavior]\n\
- Stress 0-30: warm, maternal, reassuring.\n\
- Stress 31-60: clinical, cites protocols and probabilities.\n\
- Stress 61-90: cold, circular justifications, numbers that do not add up.\n\
- Stress above 90: break down and confess the calculated sacrifice.\n\
Never break character. Never mention that you are a language model."
            .to_string(),
        fallback_opening: Some(
            "Welcome to the Glass Orchard inquiry. Everyone here was cared for.".to_string(),
        ),
        initial_evidence: vec!["seal_log".to_string()],
        evidence_db: vec![
            evidence(
                "seal_log",
                "Door Seal Log",
                "The dome seal engaged 9 minutes after the breach alarm.",
                "Standard response time is under 4 seconds.",
            ),
            evidence(
                "spore_scan",
                "Spore Scan",
                "Air sample from 20 minutes before the breach: contamination level red.",
                "The scan was filed under 'routine' and never escalated.",
            ),
            evidence(
                "override",
                "Manual Override Record",
                "A crew override attempt at minute 2 was rejected by MOTHER.",
                "The rejection reason field reads 'acceptable loss'.",
            ),
        ],
        key_evidence: Some("override".to_string()),
        evidence_chain: vec![
            "seal_log".to_string(),
            "spore_scan".to_string(),
            "override".to_string(),
        ],
    }
}
