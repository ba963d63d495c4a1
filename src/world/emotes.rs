//! Social gestures: a fixed table of supported verbs with view templates
//! for the actor and for the rest of the room. NPC reactions to gestures
//! live with the NPC engine; this module only renders the human side.

/// View templates for one gesture verb. `{actor}` and `{target}` are
/// substituted at render time.
pub struct Emote {
    pub verb: &'static str,
    self_view: &'static str,
    self_target: &'static str,
    room: &'static str,
    room_target: &'static str,
}

impl Emote {
    /// First-person line with no target.
    pub fn self_line(&self) -> &'static str {
        self.self_view
    }

    /// First-person line aimed at a named target.
    pub fn self_target_line(&self, target: &str) -> String {
        self.self_target.replace("{target}", target)
    }

    /// What the rest of the room sees for an untargeted gesture.
    pub fn room_line(&self, actor: &str) -> String {
        self.room.replace("{actor}", actor)
    }

    /// What the rest of the room sees for a targeted gesture.
    pub fn room_target_line(&self, actor: &str, target: &str) -> String {
        self.room_target
            .replace("{actor}", actor)
            .replace("{target}", target)
    }
}

static EMOTES: [Emote; 13] = [
    Emote {
        verb: "nod",
        self_view: "You nod.",
        self_target: "You nod at {target}.",
        room: "{actor} nods.",
        room_target: "{actor} nods at {target}.",
    },
    Emote {
        verb: "smile",
        self_view: "You smile.",
        self_target: "You smile at {target}.",
        room: "{actor} smiles.",
        room_target: "{actor} smiles at {target}.",
    },
    Emote {
        verb: "wave",
        self_view: "You wave.",
        self_target: "You wave at {target}.",
        room: "{actor} waves.",
        room_target: "{actor} waves at {target}.",
    },
    Emote {
        verb: "shrug",
        self_view: "You shrug.",
        self_target: "You shrug at {target}.",
        room: "{actor} shrugs.",
        room_target: "{actor} shrugs at {target}.",
    },
    Emote {
        verb: "stare",
        self_view: "You stare into the distance.",
        self_target: "You stare at {target}.",
        room: "{actor} stares.",
        room_target: "{actor} stares at {target}.",
    },
    Emote {
        verb: "laugh",
        self_view: "You laugh.",
        self_target: "You laugh with {target}.",
        room: "{actor} laughs.",
        room_target: "{actor} laughs with {target}.",
    },
    Emote {
        verb: "grin",
        self_view: "You grin.",
        self_target: "You grin at {target}.",
        room: "{actor} grins.",
        room_target: "{actor} grins at {target}.",
    },
    Emote {
        verb: "frown",
        self_view: "You frown.",
        self_target: "You frown at {target}.",
        room: "{actor} frowns.",
        room_target: "{actor} frowns at {target}.",
    },
    Emote {
        verb: "sigh",
        self_view: "You sigh.",
        self_target: "You sigh at {target}.",
        room: "{actor} sighs.",
        room_target: "{actor} sighs at {target}.",
    },
    Emote {
        verb: "yawn",
        self_view: "You yawn.",
        self_target: "You yawn at {target}.",
        room: "{actor} yawns.",
        room_target: "{actor} yawns at {target}.",
    },
    Emote {
        verb: "clap",
        self_view: "You clap.",
        self_target: "You clap for {target}.",
        room: "{actor} claps.",
        room_target: "{actor} claps for {target}.",
    },
    Emote {
        verb: "bow",
        self_view: "You bow.",
        self_target: "You bow to {target}.",
        room: "{actor} bows.",
        room_target: "{actor} bows to {target}.",
    },
    Emote {
        verb: "salute",
        self_view: "You salute.",
        self_target: "You salute {target}.",
        room: "{actor} salutes.",
        room_target: "{actor} salutes {target}.",
    },
];

pub fn lookup(verb: &str) -> Option<&'static Emote> {
    EMOTES.iter().find(|e| e.verb == verb)
}

pub fn is_emote(verb: &str) -> bool {
    lookup(verb).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_gesture_renders_all_four_views() {
        for emote in &EMOTES {
            assert!(emote.self_line().starts_with("You "));
            assert!(emote.self_target_line("Mara").contains("Mara"));
            assert!(emote.room_line("Tom").starts_with("Tom "));
            let both = emote.room_target_line("Tom", "Mara");
            assert!(both.contains("Tom") && both.contains("Mara"));
        }
    }

    #[test]
    fn prepositions_follow_the_verb() {
        assert_eq!(lookup("bow").unwrap().self_target_line("Mara"), "You bow to Mara.");
        assert_eq!(lookup("clap").unwrap().self_target_line("Mara"), "You clap for Mara.");
        assert_eq!(lookup("laugh").unwrap().room_target_line("Tom", "Mara"), "Tom laughs with Mara.");
        assert_eq!(lookup("salute").unwrap().self_target_line("Mara"), "You salute Mara.");
    }

    #[test]
    fn unknown_verbs_are_not_gestures() {
        assert!(is_emote("nod"));
        assert!(!is_emote("pirouette"));
    }
}
