use engine::{ResourceId, ResourceIdError};

pub const BOSS_MOD_NAMESPACE: &str = "mowziesmobs";
pub const THEME_NAMESPACE: &str = "boss_music";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossType {
    Frostmaw,
    FerrousWroughtnaut,
    Umvuthi,
    Sculptor,
}

impl BossType {
    pub const ALL: [BossType; 4] = [
        BossType::Frostmaw,
        BossType::FerrousWroughtnaut,
        BossType::Umvuthi,
        BossType::Sculptor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Frostmaw => "frostmaw",
            Self::FerrousWroughtnaut => "ferrous_wroughtnaut",
            Self::Umvuthi => "umvuthi",
            Self::Sculptor => "sculptor",
        }
    }

    pub fn entity_id(self) -> Result<ResourceId, ResourceIdError> {
        ResourceId::new(BOSS_MOD_NAMESPACE, self.name())
    }

    pub fn theme_id(self) -> Result<ResourceId, ResourceIdError> {
        ResourceId::new(THEME_NAMESPACE, &format!("theme.{}", self.name()))
    }

    pub fn matches_entity_type(self, type_id: &ResourceId) -> bool {
        type_id.namespace() == BOSS_MOD_NAMESPACE && type_id.path() == self.name()
    }

    pub fn from_entity_type(type_id: &ResourceId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|boss| boss.matches_entity_type(type_id))
    }
}

pub const SUPPRESSED_BOSS_MUSIC: [&str; 14] = [
    "music.frostmaw_theme",
    "music.ferrous_wroughtnaut_theme",
    "music.umvuthi_theme",
    "music.sculptor_theme_intro",
    "music.sculptor_theme_level1_1",
    "music.sculptor_theme_level1_2",
    "music.sculptor_theme_transition",
    "music.sculptor_theme_level2_1",
    "music.sculptor_theme_level2_2",
    "music.sculptor_theme_level3_1",
    "music.sculptor_theme_level3_2",
    "music.sculptor_theme_outro",
    "music.sculptor_theme_ending",
    "music.sculptor_theme_combat",
];

pub fn is_suppressed_boss_music(id: &ResourceId) -> bool {
    id.namespace() == BOSS_MOD_NAMESPACE
        && SUPPRESSED_BOSS_MUSIC
            .iter()
            .any(|path| *path == id.path())
}
