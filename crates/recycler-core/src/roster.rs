//! ============================================================================
//! Roster - Character Showcase Data
//! ============================================================================
//! Static list of showcase characters. Each one doubles as a chat persona
//! (see `chat::Persona::agent`).
//! ============================================================================

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    /// Key binding slot (Q, E, C, X)
    pub slot: String,
    pub name: String,
    pub description: String,
}

/// Showcase stat bars, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub aggression: u8,
    pub tactical: u8,
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub origin: String,
    pub bio: String,
    pub stats: AgentStats,
    pub abilities: Vec<Ability>,
}

#[derive(Debug, Clone)]
pub struct Roster {
    agents: Vec<Agent>,
}

impl Roster {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Entry the showcase opens on
    pub fn first(&self) -> Option<&Agent> {
        self.agents.first()
    }
}

fn ability(slot: &str, name: &str, description: &str) -> Ability {
    Ability {
        slot: slot.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

static BUILTIN: Lazy<Roster> = Lazy::new(|| {
    Roster::new(vec![
        Agent {
            id: "jett".into(),
            name: "JETT".into(),
            role: "Duelist".into(),
            origin: "South Korea".into(),
            bio: "Representing her home country of South Korea, Jett's agile and evasive \
                  fighting style lets her take risks no one else can."
                .into(),
            stats: AgentStats { aggression: 95, tactical: 40, difficulty: 60 },
            abilities: vec![
                ability("Q", "Updraft", "Instantly propel Jett high into the air."),
                ability("E", "Tailwind", "Instantly propel Jett in the direction she is moving."),
                ability("C", "Cloudburst", "Throw a projectile that expands into a brief vision-blocking cloud."),
                ability("X", "Blade Storm", "Equip a set of highly accurate throwing knives."),
            ],
        },
        Agent {
            id: "sage".into(),
            name: "SAGE".into(),
            role: "Sentinel".into(),
            origin: "China".into(),
            bio: "The stronghold of China, Sage creates safety for herself and her team \
                  wherever she goes."
                .into(),
            stats: AgentStats { aggression: 30, tactical: 90, difficulty: 40 },
            abilities: vec![
                ability("Q", "Slow Orb", "Throw a slowing orb that creates a lingering field."),
                ability("E", "Healing Orb", "Heal an ally or yourself over time."),
                ability("C", "Barrier Orb", "Deploy a solid wall."),
                ability("X", "Resurrection", "Revive a fallen ally with full health."),
            ],
        },
        Agent {
            id: "viper".into(),
            name: "VIPER".into(),
            role: "Controller".into(),
            origin: "USA".into(),
            bio: "The American chemist, Viper deploys an array of poisonous chemical devices \
                  to control the battlefield and cripple the enemy's vision."
                .into(),
            stats: AgentStats { aggression: 60, tactical: 95, difficulty: 80 },
            abilities: vec![
                ability("Q", "Poison Cloud", "Deploy a gas emitter that creates a toxic smoke cloud."),
                ability("E", "Toxic Screen", "Deploy a long line of gas emitters that creates a wall of toxic gas."),
                ability("C", "Snake Bite", "Fire a canister that shatters and creates a chemical pool."),
                ability("X", "Viper's Pit", "Create a massive chemical cloud that obscures vision and decays health."),
            ],
        },
        Agent {
            id: "kayo".into(),
            name: "KAY/O".into(),
            role: "Initiator".into(),
            origin: "Unknown".into(),
            bio: "KAY/O is a machine of war built for a single purpose: neutralizing radiants."
                .into(),
            stats: AgentStats { aggression: 80, tactical: 75, difficulty: 70 },
            abilities: vec![
                ability("Q", "FLASH/drive", "Throw a flash that explodes after a short fuse."),
                ability("E", "ZERO/point", "Throw a suppression blade that suppresses anyone in the radius."),
                ability("C", "FRAG/ment", "Throw an explosive fragment that pulses multiple times."),
                ability("X", "NULL/cmd", "Overload with polarized radianite energy that suppresses enemies."),
            ],
        },
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roster() {
        let roster = Roster::builtin();
        assert_eq!(roster.agents().len(), 4);
        assert_eq!(roster.first().map(|a| a.id.as_str()), Some("jett"));
        assert!(roster.agents().iter().all(|a| a.abilities.len() == 4));
    }

    #[test]
    fn test_empty_roster_has_no_first() {
        let roster = Roster::new(Vec::new());
        assert!(roster.first().is_none());
        assert!(roster.get("jett").is_none());
    }

    #[test]
    fn test_get_agent() {
        let roster = Roster::builtin();
        assert_eq!(roster.get("kayo").unwrap().name, "KAY/O");
        assert!(roster.get("reyna").is_none());
    }
}
