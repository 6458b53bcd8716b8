/// The catalog of destination eras
///
/// Scenes are static data: they drive the generation prompt and the colours of
/// their cards in the picker.

/// A gradient accent for a scene card, as two sRGB colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTag {
    pub from: [u8; 3],
    pub to: [u8; 3],
}

/// A themed destination
#[derive(Debug, PartialEq, Eq)]
pub struct Scene {
    /// Stable identifier (used in download file names)
    pub id: &'static str,
    pub title: &'static str,
    /// Short subtitle shown under the title
    pub description: &'static str,
    /// Where to place the person, spliced into the model instruction
    pub prompt_fragment: &'static str,
    pub icon: &'static str,
    pub color_tag: ColorTag,
}

pub static SCENES: [Scene; 6] = [
    Scene {
        id: "egypt",
        title: "Ancient Egypt",
        description: "Pharaohs and Pyramids (c. 2500 BC)",
        prompt_fragment: "in Ancient Egypt with the Great Pyramids in the background, wearing elaborate golden pharaoh jewelry and white linen robes, cinematic lighting, warm desert tones",
        icon: "🏺",
        color_tag: ColorTag { from: [0xca, 0x8a, 0x04], to: [0xf9, 0x73, 0x16] },
    },
    Scene {
        id: "victorian",
        title: "Victorian London",
        description: "Steam and Cobblestones (c. 1890)",
        prompt_fragment: "in foggy Victorian London on a cobblestone street, wearing a formal 19th-century suit or dress with steampunk accents, gaslight atmosphere, moody aesthetics",
        icon: "🎩",
        color_tag: ColorTag { from: [0x37, 0x41, 0x51], to: [0x0f, 0x17, 0x2a] },
    },
    Scene {
        id: "cyberpunk",
        title: "Neo-Tokyo 2077",
        description: "Neon Lights and Chrome (Future)",
        prompt_fragment: "in a futuristic cyberpunk city with neon signs and flying cars, wearing high-tech tactical gear and glowing cybernetic accessories, vibrant pink and blue lighting",
        icon: "🦾",
        color_tag: ColorTag { from: [0xdb, 0x27, 0x77], to: [0x93, 0x33, 0xea] },
    },
    Scene {
        id: "medieval",
        title: "Medieval Kingdom",
        description: "Knights and Castles (c. 1200)",
        prompt_fragment: "in a medieval stone castle courtyard, wearing royal armor or medieval noble clothing, dramatic lighting, fantasy realism style",
        icon: "⚔️",
        color_tag: ColorTag { from: [0xb9, 0x1c, 0x1c], to: [0x88, 0x13, 0x37] },
    },
    Scene {
        id: "roaring20s",
        title: "The Roaring 20s",
        description: "Jazz and Art Deco (c. 1920)",
        prompt_fragment: "at a lavish 1920s Art Deco jazz party, wearing a Great Gatsby style tuxedo or flapper dress, champagne gold lighting, vintage film grain style",
        icon: "🎷",
        color_tag: ColorTag { from: [0x04, 0x78, 0x57], to: [0x13, 0x4e, 0x4a] },
    },
    Scene {
        id: "viking",
        title: "Viking Age",
        description: "Fjords and Longships (c. 900)",
        prompt_fragment: "standing on the deck of a Viking longship in a snowy fjord, wearing fur and leather armor, epic cinematic composition, cold blue tones",
        icon: "🛡️",
        color_tag: ColorTag { from: [0x03, 0x69, 0xa1], to: [0x1e, 0x3a, 0x8a] },
    },
];

/// Look up a scene by identifier
pub fn find(id: &str) -> Option<&'static Scene> {
    SCENES.iter().find(|scene| scene.id == id)
}

/// All scenes, in display order
pub fn all() -> &'static [Scene] {
    &SCENES
}
