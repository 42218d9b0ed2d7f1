use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderMessage {
    pub title: &'static str,
    pub body: &'static str,
}

pub const HYDRATION_REMINDER: ReminderMessage = ReminderMessage {
    title: "💧 Hydration Reminder",
    body: "Time to drink some water! Stay hydrated! 💦",
};

pub const FALLBACK_REMINDER: ReminderMessage = ReminderMessage {
    title: "🌟 SmartDiet Reminder",
    body: "We miss you! Come back and continue your healthy journey.",
};

/// Topics an inactivity reminder can be about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderCategory {
    Hydration,
    HealthyEating,
    MealTracking,
    Exercise,
}

impl ReminderCategory {
    pub const ALL: [Self; 4] = [
        Self::Hydration,
        Self::HealthyEating,
        Self::MealTracking,
        Self::Exercise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hydration => "hydration",
            Self::HealthyEating => "healthy_eating",
            Self::MealTracking => "meal_tracking",
            Self::Exercise => "exercise",
        }
    }

    /// Uniformly random category
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        *Self::ALL.choose(&mut rng).unwrap_or(&Self::Hydration)
    }

    pub fn message(&self) -> ReminderMessage {
        match self {
            Self::Hydration => ReminderMessage {
                title: "💧 Stay Hydrated!",
                body: "Don't forget to drink water! Your body needs hydration.",
            },
            Self::HealthyEating => ReminderMessage {
                title: "🥗 Eat Healthy Today!",
                body: "Remember to make healthy food choices. Your body will thank you!",
            },
            Self::MealTracking => ReminderMessage {
                title: "📝 Track Your Meals",
                body: "Keep track of your meals to reach your health goals!",
            },
            Self::Exercise => ReminderMessage {
                title: "💪 Stay Active!",
                body: "A little movement goes a long way. Try to stay active today!",
            },
        }
    }
}

/// Look up reminder text by category name
pub fn reminder_message(category: &str) -> ReminderMessage {
    ReminderCategory::ALL
        .iter()
        .find(|c| c.as_str() == category)
        .map(|c| c.message())
        .unwrap_or(FALLBACK_REMINDER)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_reminder_lookup() {
        assert_eq!(reminder_message("exercise").title, "💪 Stay Active!");
        assert_eq!(reminder_message("meal_tracking"), ReminderCategory::MealTracking.message());
        assert_eq!(reminder_message("sleep"), FALLBACK_REMINDER);
    }

    #[test]
    fn test_random_covers_all_categories() {
        let seen: HashSet<&str> = (0..1000).map(|_| ReminderCategory::random().as_str()).collect();
        assert_eq!(seen.len(), ReminderCategory::ALL.len());
    }
}
