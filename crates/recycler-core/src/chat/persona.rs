//! Chat personas: who the model speaks as, and what to show when it can't.

use serde::{Deserialize, Serialize};

use crate::roster::Agent;
use crate::types::CatalogItem;

const AGENT_EMPTY_REPLY: &str = "COMMUNICATION INTERRUPTED.";
const AGENT_FALLBACK: &str = "ARCHIVE UPLINK FAILED. SIGNAL LOST.";

const SUPPORT_GREETING: &str = "IJONG-SUPPORT Online. Bagaimana saya bisa membantu Anda hari ini? \
     Saya bisa memberikan saran teknis, info stok, atau bantuan build PC.";
const SUPPORT_EMPTY_REPLY: &str = "Gagal terhubung ke pusat data.";
const SUPPORT_FALLBACK: &str = "Terjadi gangguan sinyal. Mohon ulangi kembali.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name, also used in logs
    pub name: String,
    pub system_prompt: String,
    pub temperature: f32,
    /// Shown when the model answers with nothing
    pub empty_reply: String,
    /// Shown when the call fails or times out
    pub fallback: String,
    /// Opening assistant message of a fresh conversation
    pub greeting: Option<String>,
}

impl Persona {
    /// Stay-in-character voice of a showcase agent
    pub fn agent(agent: &Agent) -> Self {
        let system_prompt = format!(
            "You are {name}, a {role} from VALORANT. You come from {origin}. Background: {bio}\n\
             Rules:\n\
             1. Talk exactly like {name} does in the game, catchphrases and attitude included.\n\
             2. Answer in two or three sentences at most.\n\
             3. Use uppercase only for emphasis.\n\
             4. Never break character.\n\
             5. Answer in English unless the user insists on another language; keep {name}'s flavor either way.",
            name = agent.name,
            role = agent.role,
            origin = agent.origin,
            bio = agent.bio,
        );

        Self {
            name: agent.name.clone(),
            system_prompt,
            temperature: 0.8,
            empty_reply: AGENT_EMPTY_REPLY.to_string(),
            fallback: AGENT_FALLBACK.to_string(),
            greeting: None,
        }
    }

    /// Product-page advisor grounded on one catalog item
    pub fn tech_advisor(item: &CatalogItem) -> Self {
        let specs = item
            .specs
            .iter()
            .map(|s| format!("- {}: {}", s.label, s.value))
            .collect::<Vec<_>>()
            .join("\n");

        let system_prompt = format!(
            "You are the Ijong Mechanics tech advisor. The customer is looking at \"{}\" \
             ({}, ${:.2}, {}% recycled material{}).\n\
             Description: {}\n\
             Specs:\n{}\n\
             Give short, practical hardware advice about this part: compatibility, \
             expected performance and whether it suits the customer's build. \
             Do not invent specs that are not listed.",
            item.name,
            item.category.label(),
            item.price,
            item.recycled_content,
            if item.is_upcycled { ", upcycled" } else { "" },
            item.description,
            if specs.is_empty() { "- none listed".to_string() } else { specs },
        );

        Self {
            name: "TECH-ADVISOR".to_string(),
            system_prompt,
            temperature: 0.7,
            empty_reply: AGENT_EMPTY_REPLY.to_string(),
            fallback: AGENT_FALLBACK.to_string(),
            greeting: None,
        }
    }

    /// Indonesian-language support desk
    pub fn customer_service() -> Self {
        Self {
            name: "Ijong-Support".to_string(),
            system_prompt: "Anda adalah asisten layanan pelanggan Ijong Mechanics bernama \
                \"Ijong-Support\". Anda menguasai perangkat keras komputer (GPU, CPU, monitor) \
                dan daur ulang teknologi (upcycling). Gaya bicara Anda membantu dan teknis, \
                tetap santai dan bernuansa industrial. Jawab dalam Bahasa Indonesia secara ringkas."
                .to_string(),
            temperature: 0.7,
            empty_reply: SUPPORT_EMPTY_REPLY.to_string(),
            fallback: SUPPORT_FALLBACK.to_string(),
            greeting: Some(SUPPORT_GREETING.to_string()),
        }
    }
}
