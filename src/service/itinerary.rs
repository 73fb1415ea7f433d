//! Itinerary service
//!
//! Rule-based trip planner over the static monastery catalog, plus
//! ownership-checked access to stored itineraries.

use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use sqlx::types::Json;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::auth::{Capability, Identity};
use crate::data::{
    Database, EntityId, Itinerary, ItinerarySearch, MonasteryRecord, SelectedMonastery, catalog,
};
use crate::error::AppError;
use crate::metrics::ITINERARIES_GENERATED_TOTAL;

pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 10;

/// Places listed in the afternoon block of a full day
const NEARBY_PLACES_PER_DAY: usize = 3;
/// Nearby places quoted in the notes
const NOTES_HIGHLIGHTS: usize = 5;

/// Spending tier picked by the traveller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetTier {
    Low,
    Medium,
    High,
    Luxury,
}

impl BudgetTier {
    /// Parse a budget category, falling back to Medium for anything unknown
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "luxury" => Self::Luxury,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Luxury => "Luxury",
        }
    }

    /// Estimated spend per day, in INR
    pub fn daily_cost(&self) -> i64 {
        match self {
            Self::Low => 2000,
            Self::Medium => 3500,
            Self::High => 5500,
            Self::Luxury => 8000,
        }
    }
}

/// Trip preferences as submitted by the client
///
/// Only `days` is required. Missing or blank fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripPreferences {
    pub days: Option<i64>,
    pub travel_experience: Option<String>,
    pub budget_category: Option<String>,
    pub season: Option<String>,
    pub weather_condition: Option<String>,
    pub stay_type: Option<String>,
    pub food_preference: Option<String>,
    pub recommended_transport: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl TripPreferences {
    /// Validated day count
    pub fn validated_days(&self) -> Result<u32, AppError> {
        let days = self
            .days
            .ok_or_else(|| AppError::Validation("days is required".to_string()))?;
        if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "days must be between {} and {}",
                MIN_DAYS, MAX_DAYS
            )));
        }
        Ok(days as u32)
    }

    fn resolve(&self) -> Result<ResolvedTrip, AppError> {
        Ok(ResolvedTrip {
            days: self.validated_days()?,
            travel_experience: or_default(&self.travel_experience, "Beginner"),
            budget: BudgetTier::parse(self.budget_category.as_deref().unwrap_or_default()),
            season: or_default(&self.season, "Spring"),
            weather_condition: or_default(&self.weather_condition, "Clear"),
            stay_type: or_default(&self.stay_type, "Homestay"),
            food_preference: or_default(&self.food_preference, "Local Sikkimese cuisine"),
            recommended_transport: or_default(&self.recommended_transport, "Shared taxi"),
        })
    }
}

#[derive(Debug, Clone)]
struct ResolvedTrip {
    days: u32,
    travel_experience: String,
    budget: BudgetTier,
    season: String,
    weather_condition: String,
    stay_type: String,
    food_preference: String,
    recommended_transport: String,
}

/// Output of the planner, before it is tied to an owner
#[derive(Debug, Clone)]
pub struct ItineraryPlan {
    pub title: String,
    pub days: u32,
    pub travel_experience: String,
    pub budget: BudgetTier,
    pub season: String,
    pub weather_condition: String,
    pub stay_type: String,
    pub food_preference: String,
    pub recommended_transport: String,
    /// Visited monasteries in visiting order
    pub monasteries: Vec<SelectedMonastery>,
    pub day_plan: String,
    pub daily_cost: i64,
    pub estimated_total: i64,
    pub notes: String,
}

/// Build a day-by-day plan
///
/// Picks `max(1, days - 1)` monasteries at random without replacement,
/// capped at the catalog size. Day 1 is the arrival day, the last day is
/// the departure day, and each day in between visits the next selected
/// monastery. Once the selection runs out, remaining interior days become
/// free exploration days around the last visited monastery's town.
///
/// # Errors
/// Validation error for a day count outside 1..=10
pub fn plan_itinerary<R: Rng + ?Sized>(
    preferences: &TripPreferences,
    catalog: &[MonasteryRecord],
    rng: &mut R,
) -> Result<ItineraryPlan, AppError> {
    let trip = preferences.resolve()?;

    if catalog.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Monastery catalog is empty"
        )));
    }

    let wanted = (trip.days as usize).saturating_sub(1).max(1);
    let count = wanted.min(catalog.len());

    let mut pool: Vec<&MonasteryRecord> = catalog.iter().collect();
    let (selection, _) = pool.partial_shuffle(rng, count);
    let selection: Vec<&MonasteryRecord> = selection.to_vec();

    let mut plan = String::new();
    let mut visited: Vec<SelectedMonastery> = Vec::new();

    if trip.days == 1 {
        let monastery = selection[0];
        render_single_day(&mut plan, monastery, &trip);
        visited.push(selected(monastery, 1));
    } else {
        // Day 1 always visits selection[0]
        let mut next = 0;
        render_arrival(&mut plan, selection[next], &trip);
        visited.push(selected(selection[next], 1));
        next += 1;

        for day in 2..trip.days {
            if let Some(monastery) = selection.get(next) {
                render_full_day(&mut plan, day, monastery, &trip);
                visited.push(selected(monastery, day));
                next += 1;
            } else {
                render_free_day(&mut plan, day, selection[next - 1], &trip);
            }
        }

        render_departure(&mut plan, trip.days, selection[next - 1], &trip);
    }

    let notes = build_notes(&selection, &trip);
    let daily_cost = trip.budget.daily_cost();

    Ok(ItineraryPlan {
        title: format!(
            "{}-Day {} Monastery Journey",
            trip.days, trip.travel_experience
        ),
        days: trip.days,
        travel_experience: trip.travel_experience,
        budget: trip.budget,
        season: trip.season,
        weather_condition: trip.weather_condition,
        stay_type: trip.stay_type,
        food_preference: trip.food_preference,
        recommended_transport: trip.recommended_transport,
        monasteries: visited,
        day_plan: plan.trim_end().to_string(),
        daily_cost,
        estimated_total: daily_cost * i64::from(trip.days),
        notes,
    })
}

fn selected(monastery: &MonasteryRecord, day: u32) -> SelectedMonastery {
    SelectedMonastery {
        name: monastery.name.to_string(),
        day,
        nearest_town: monastery.nearest_town.to_string(),
    }
}

fn location_line(plan: &mut String, monastery: &MonasteryRecord) {
    let _ = writeln!(
        plan,
        "Location: {}, near {} ({})",
        monastery.name, monastery.nearest_town, monastery.district
    );
}

fn render_arrival(plan: &mut String, monastery: &MonasteryRecord, trip: &ResolvedTrip) {
    let _ = writeln!(plan, "Day 1: Arrival and {}", monastery.name);
    location_line(plan, monastery);
    let _ = writeln!(
        plan,
        "Morning: Arrive in {} and transfer by {}. Check in to your {}.",
        monastery.nearest_town, trip.recommended_transport, trip.stay_type
    );
    let _ = writeln!(
        plan,
        "Afternoon: Visit {}. {}",
        monastery.name, monastery.description
    );
    if let Some(place) = monastery.nearby_places.first() {
        let _ = writeln!(plan, "Highlight: {}", place);
    }
    let _ = writeln!(
        plan,
        "Evening: Rest and acclimatise. Dinner: {}.",
        trip.food_preference
    );
    plan.push('\n');
}

fn render_full_day(plan: &mut String, day: u32, monastery: &MonasteryRecord, trip: &ResolvedTrip) {
    let _ = writeln!(plan, "Day {}: {}", day, monastery.name);
    location_line(plan, monastery);
    let _ = writeln!(
        plan,
        "Morning: Travel to {} by {} and join the morning prayers at {}.",
        monastery.nearest_town, trip.recommended_transport, monastery.name
    );
    let _ = writeln!(plan, "Afternoon: Explore nearby places:");
    for (index, place) in monastery
        .nearby_places
        .iter()
        .take(NEARBY_PLACES_PER_DAY)
        .enumerate()
    {
        let _ = writeln!(plan, "  {}. {}", index + 1, place);
    }
    let _ = writeln!(
        plan,
        "Evening: {}",
        monastery.activities.join(", ")
    );
    if let Some(place) = monastery.nearby_places.get(NEARBY_PLACES_PER_DAY) {
        let _ = writeln!(plan, "Sunset option: {}", place);
    }
    plan.push('\n');
}

fn render_free_day(plan: &mut String, day: u32, last: &MonasteryRecord, trip: &ResolvedTrip) {
    let _ = writeln!(plan, "Day {}: Free exploration in {}", day, last.nearest_town);
    let _ = writeln!(plan, "Location: {} ({})", last.nearest_town, last.district);
    let _ = writeln!(
        plan,
        "Morning: Revisit {} at your own pace or join a local meditation session.",
        last.name
    );
    let _ = writeln!(
        plan,
        "Afternoon: Wander the markets of {} and try {}.",
        last.nearest_town, trip.food_preference
    );
    let _ = writeln!(
        plan,
        "Evening: Relax at your {}; {} weather is typical in {}.",
        trip.stay_type, trip.weather_condition, trip.season
    );
    plan.push('\n');
}

fn render_departure(plan: &mut String, day: u32, last: &MonasteryRecord, trip: &ResolvedTrip) {
    let _ = writeln!(plan, "Day {}: Departure", day);
    let _ = writeln!(plan, "Location: {} ({})", last.nearest_town, last.district);
    let _ = writeln!(
        plan,
        "Morning: Final visit to {} for the morning prayers.",
        last.name
    );
    let _ = writeln!(
        plan,
        "Afternoon: Check out and depart from {} by {}.",
        last.nearest_town, trip.recommended_transport
    );
    plan.push('\n');
}

fn render_single_day(plan: &mut String, monastery: &MonasteryRecord, trip: &ResolvedTrip) {
    let _ = writeln!(plan, "Day 1: Arrival, {} and Departure", monastery.name);
    location_line(plan, monastery);
    let _ = writeln!(
        plan,
        "Morning: Arrive in {} by {}.",
        monastery.nearest_town, trip.recommended_transport
    );
    let _ = writeln!(
        plan,
        "Afternoon: Visit {}. {}",
        monastery.name, monastery.description
    );
    if let Some(place) = monastery.nearby_places.first() {
        let _ = writeln!(plan, "Highlight: {}", place);
    }
    let _ = writeln!(
        plan,
        "Evening: Depart from {} after an early dinner ({}).",
        monastery.nearest_town, trip.food_preference
    );
}

fn build_notes(selection: &[&MonasteryRecord], trip: &ResolvedTrip) -> String {
    let towns: BTreeSet<&str> = selection.iter().map(|m| m.nearest_town).collect();
    let highlights: Vec<&str> = selection
        .iter()
        .filter_map(|m| m.nearby_places.first().copied())
        .take(NOTES_HIGHLIGHTS)
        .collect();

    let mut notes = format!(
        "Destinations: {}. Monasteries: {}.",
        towns.into_iter().collect::<Vec<_>>().join(", "),
        selection.len()
    );
    if !highlights.is_empty() {
        let _ = write!(notes, " Nearby highlights: {}.", highlights.join(", "));
    }
    let _ = write!(
        notes,
        " Budget: {} (about INR {} per day). Best visited in {}.",
        trip.budget.as_str(),
        trip.budget.daily_cost(),
        trip.season
    );
    notes
}

/// Itinerary service
pub struct ItineraryService {
    db: Arc<Database>,
}

impl ItineraryService {
    /// Create new itinerary service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Generate and persist an itinerary for `owner`
    pub async fn generate(
        &self,
        owner: &Identity,
        preferences: TripPreferences,
    ) -> Result<Itinerary, AppError> {
        owner.require(Capability::GenerateItineraries)?;

        let plan = plan_itinerary(&preferences, catalog::monasteries(), &mut rand::thread_rng())?;

        let itinerary = Itinerary {
            id: EntityId::new().0,
            user_id: owner.id.clone(),
            title: plan.title,
            days: i64::from(plan.days),
            travel_experience: plan.travel_experience,
            budget_category: plan.budget.as_str().to_string(),
            season: plan.season,
            weather_condition: plan.weather_condition,
            stay_type: plan.stay_type,
            food_preference: plan.food_preference,
            recommended_transport: plan.recommended_transport,
            monasteries: Json(plan.monasteries),
            day_plan: plan.day_plan,
            daily_cost: plan.daily_cost,
            estimated_total: plan.estimated_total,
            notes: plan.notes,
            is_public: preferences.is_public,
            created_at: Utc::now(),
        };

        self.db.insert_itinerary(&itinerary).await?;

        ITINERARIES_GENERATED_TOTAL
            .with_label_values(&[plan.budget.as_str()])
            .inc();
        tracing::info!(
            itinerary_id = %itinerary.id,
            owner = %owner.id,
            days = itinerary.days,
            "Itinerary generated"
        );

        Ok(itinerary)
    }

    /// Fetch an itinerary readable by `viewer`
    ///
    /// Private itineraries are only readable by their owner.
    pub async fn get_for(&self, viewer: &Identity, id: &str) -> Result<Itinerary, AppError> {
        let itinerary = self.db.get_itinerary(id).await?.ok_or(AppError::NotFound)?;
        if !itinerary.is_public && !viewer.owns(&itinerary.user_id) {
            return Err(AppError::Forbidden);
        }
        Ok(itinerary)
    }

    /// Delete an itinerary owned by `viewer`
    pub async fn delete_for(&self, viewer: &Identity, id: &str) -> Result<(), AppError> {
        let itinerary = self.db.get_itinerary(id).await?.ok_or(AppError::NotFound)?;
        if !viewer.owns(&itinerary.user_id) {
            return Err(AppError::Forbidden);
        }
        self.db.delete_itinerary(id).await?;
        tracing::info!(itinerary_id = %id, "Itinerary deleted");
        Ok(())
    }

    pub async fn list_for_owner(&self, owner: &Identity) -> Result<Vec<Itinerary>, AppError> {
        self.db.list_itineraries_by_user(&owner.id).await
    }

    pub async fn search(&self, search: &ItinerarySearch) -> Result<Vec<Itinerary>, AppError> {
        self.db.search_itineraries(search).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn prefs(days: i64) -> TripPreferences {
        TripPreferences {
            days: Some(days),
            ..Default::default()
        }
    }

    fn day_blocks(plan: &str) -> Vec<&str> {
        plan.lines().filter(|line| line.starts_with("Day ")).collect()
    }

    #[test]
    fn rejects_days_out_of_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for days in [0, 11, -3] {
            let result = plan_itinerary(&prefs(days), catalog::monasteries(), &mut rng);
            assert!(matches!(result, Err(AppError::Validation(_))), "days={days}");
        }
        let missing = plan_itinerary(&TripPreferences::default(), catalog::monasteries(), &mut rng);
        assert!(matches!(missing, Err(AppError::Validation(_))));
    }

    #[test]
    fn produces_one_block_per_day() {
        let mut rng = StdRng::seed_from_u64(7);
        for days in MIN_DAYS..=MAX_DAYS {
            let plan = plan_itinerary(&prefs(days), catalog::monasteries(), &mut rng).unwrap();
            assert_eq!(day_blocks(&plan.day_plan).len(), days as usize, "days={days}");
            assert_eq!(plan.days as i64, days);
        }
    }

    #[test]
    fn visits_distinct_monasteries() {
        let mut rng = StdRng::seed_from_u64(42);
        for days in 2..=MAX_DAYS {
            let plan = plan_itinerary(&prefs(days), catalog::monasteries(), &mut rng).unwrap();
            let names: HashSet<_> = plan.monasteries.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names.len(), plan.monasteries.len());
            assert_eq!(plan.monasteries.len(), (days - 1) as usize);

            let assigned: Vec<u32> = plan.monasteries.iter().map(|m| m.day).collect();
            let expected: Vec<u32> = (1..days as u32).collect();
            assert_eq!(assigned, expected);
        }
    }

    #[test]
    fn single_day_is_combined() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = plan_itinerary(&prefs(1), catalog::monasteries(), &mut rng).unwrap();

        let blocks = day_blocks(&plan.day_plan);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("Arrival"));
        assert!(blocks[0].contains("Departure"));
        assert_eq!(plan.monasteries.len(), 1);
        assert_eq!(plan.monasteries[0].day, 1);
    }

    #[test]
    fn departure_references_last_visited() {
        let mut rng = StdRng::seed_from_u64(11);
        let plan = plan_itinerary(&prefs(4), catalog::monasteries(), &mut rng).unwrap();

        let last = plan.monasteries.last().unwrap();
        let departure = plan.day_plan.split("Day 4: Departure").nth(1).unwrap();
        assert!(departure.contains(&last.name));
    }

    #[test]
    fn small_catalog_caps_selection_and_fills_free_days() {
        let small = &catalog::monasteries()[..2];
        let mut rng = StdRng::seed_from_u64(5);
        let plan = plan_itinerary(&prefs(6), small, &mut rng).unwrap();

        assert_eq!(plan.monasteries.len(), 2);
        assert_eq!(day_blocks(&plan.day_plan).len(), 6);
        assert_eq!(plan.day_plan.matches("Free exploration in").count(), 3);

        let last = plan.monasteries.last().unwrap();
        assert!(plan.day_plan.contains(&format!(
            "Free exploration in {}",
            last.nearest_town
        )));
    }

    #[test]
    fn budget_mapping_is_exact() {
        assert_eq!(BudgetTier::parse("Low").daily_cost(), 2000);
        assert_eq!(BudgetTier::parse("medium").daily_cost(), 3500);
        assert_eq!(BudgetTier::parse("HIGH").daily_cost(), 5500);
        assert_eq!(BudgetTier::parse("Luxury").daily_cost(), 8000);
        assert_eq!(BudgetTier::parse("backpacker").daily_cost(), 3500);
        assert_eq!(BudgetTier::parse("").daily_cost(), 3500);
    }

    #[test]
    fn title_and_costs_follow_preferences() {
        let mut rng = StdRng::seed_from_u64(9);
        let preferences = TripPreferences {
            days: Some(5),
            travel_experience: Some("Spiritual".to_string()),
            budget_category: Some("High".to_string()),
            stay_type: Some("  ".to_string()),
            ..Default::default()
        };
        let plan = plan_itinerary(&preferences, catalog::monasteries(), &mut rng).unwrap();

        assert_eq!(plan.title, "5-Day Spiritual Monastery Journey");
        assert_eq!(plan.daily_cost, 5500);
        assert_eq!(plan.estimated_total, 27_500);
        assert_eq!(plan.stay_type, "Homestay");
        assert!(plan.notes.contains("Destinations:"));
    }

    #[test]
    fn same_seed_same_plan() {
        let a = plan_itinerary(&prefs(6), catalog::monasteries(), &mut StdRng::seed_from_u64(99))
            .unwrap();
        let b = plan_itinerary(&prefs(6), catalog::monasteries(), &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(a.monasteries, b.monasteries);
        assert_eq!(a.day_plan, b.day_plan);
    }
}
