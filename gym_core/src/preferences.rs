//! User plan, profile and preference types.
//!
//! Preferences are stored whole but updated through [`PreferencesPatch`],
//! which validates every field it touches.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserPlan {
    #[default]
    Free,
    Premium,
}

impl fmt::Display for UserPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserPlan::Free => f.write_str("free"),
            UserPlan::Premium => f.write_str("premium"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub plan: UserPlan,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Es,
    En,
    Fr,
}

impl FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "es" => Ok(Lang::Es),
            "en" => Ok(Lang::En),
            "fr" => Ok(Lang::Fr),
            other => Err(Error::Validation(format!("Unsupported language: {}", other))),
        }
    }
}

/// Default rest period between sets. Stored as plain seconds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u32", into = "u32")]
pub enum RestTimer {
    Sec60,
    #[default]
    Sec90,
    Sec120,
    Sec180,
}

impl RestTimer {
    pub fn seconds(self) -> u32 {
        match self {
            RestTimer::Sec60 => 60,
            RestTimer::Sec90 => 90,
            RestTimer::Sec120 => 120,
            RestTimer::Sec180 => 180,
        }
    }
}

impl TryFrom<u32> for RestTimer {
    type Error = Error;

    fn try_from(seconds: u32) -> Result<Self> {
        match seconds {
            60 => Ok(RestTimer::Sec60),
            90 => Ok(RestTimer::Sec90),
            120 => Ok(RestTimer::Sec120),
            180 => Ok(RestTimer::Sec180),
            other => Err(Error::Validation(format!(
                "Rest timer must be 60, 90, 120 or 180 seconds, got {}",
                other
            ))),
        }
    }
}

impl From<RestTimer> for u32 {
    fn from(timer: RestTimer) -> Self {
        timer.seconds()
    }
}

/// Which helper buttons an exercise row shows
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonSet {
    pub video: bool,
    pub image: bool,
    pub anatomy: bool,
}

impl Default for ButtonSet {
    fn default() -> Self {
        Self {
            video: true,
            image: false,
            anatomy: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseButtons {
    pub routine_form: ButtonSet,
    pub workout_view: ButtonSet,
}

/// App colour theme. Everything except `Dark` requires premium.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Dark,
    Midnight,
    Ocean,
    Forest,
    Rose,
}

impl ThemeId {
    pub const FREE: ThemeId = ThemeId::Dark;
    pub const PREMIUM: [ThemeId; 4] = [
        ThemeId::Midnight,
        ThemeId::Ocean,
        ThemeId::Forest,
        ThemeId::Rose,
    ];

    pub fn is_premium(self) -> bool {
        self != ThemeId::FREE
    }
}

/// Fields missing from a stored document take their default one by one,
/// so older files keep the values they do have.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    /// Training days per week, 1-7
    pub weekly_goal: u8,
    pub lang: Lang,
    pub rest_timer_default: RestTimer,
    pub exercise_buttons: ExerciseButtons,
    pub theme: ThemeId,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            weekly_goal: 4,
            lang: Lang::Es,
            rest_timer_default: RestTimer::Sec90,
            exercise_buttons: ExerciseButtons::default(),
            theme: ThemeId::Dark,
        }
    }
}

impl UserPreferences {
    /// The theme actually applied for `plan`; free users are locked to the free theme.
    pub fn effective_theme(&self, plan: UserPlan) -> ThemeId {
        match plan {
            UserPlan::Premium => self.theme,
            UserPlan::Free => ThemeId::FREE,
        }
    }
}

/// Partial preferences update. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Lang>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_timer_default: Option<RestTimer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_buttons: Option<ExerciseButtons>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeId>,
}

impl PreferencesPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate and merge into `prefs`. On error `prefs` is left unchanged.
    pub fn apply(&self, prefs: &mut UserPreferences) -> Result<()> {
        if let Some(goal) = self.weekly_goal {
            if !(1..=7).contains(&goal) {
                return Err(Error::Validation(format!(
                    "Weekly goal must be between 1 and 7, got {}",
                    goal
                )));
            }
        }

        if let Some(goal) = self.weekly_goal {
            prefs.weekly_goal = goal;
        }
        if let Some(lang) = self.lang {
            prefs.lang = lang;
        }
        if let Some(timer) = self.rest_timer_default {
            prefs.rest_timer_default = timer;
        }
        if let Some(buttons) = self.exercise_buttons {
            prefs.exercise_buttons = buttons;
        }
        if let Some(theme) = self.theme {
            prefs.theme = theme;
        }
        Ok(())
    }

    /// Patch that rewrites every field of `prefs`
    pub fn from_full(prefs: &UserPreferences) -> Self {
        Self {
            weekly_goal: Some(prefs.weekly_goal),
            lang: Some(prefs.lang),
            rest_timer_default: Some(prefs.rest_timer_default),
            exercise_buttons: Some(prefs.exercise_buttons),
            theme: Some(prefs.theme),
        }
    }
}
