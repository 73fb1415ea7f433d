//! Static monastery catalog
//!
//! Reference data the itinerary planner selects from. Never mutated.

use serde::Serialize;

/// One monastery and what there is to do around it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonasteryRecord {
    pub name: &'static str,
    pub nearest_town: &'static str,
    pub district: &'static str,
    pub description: &'static str,
    /// Ordered by how worthwhile a detour is
    pub nearby_places: &'static [&'static str],
    pub activities: &'static [&'static str],
    pub best_time: &'static str,
}

/// All monasteries known to the planner
pub fn monasteries() -> &'static [MonasteryRecord] {
    CATALOG
}

/// Look up a monastery by name, ignoring case
pub fn find(name: &str) -> Option<&'static MonasteryRecord> {
    let needle = name.trim();
    CATALOG
        .iter()
        .find(|monastery| monastery.name.eq_ignore_ascii_case(needle))
}

static CATALOG: &[MonasteryRecord] = &[
    MonasteryRecord {
        name: "Rumtek Monastery",
        nearest_town: "Gangtok",
        district: "East Sikkim",
        description: "Seat of the Karmapa and the largest monastery in Sikkim, rebuilt in the 1960s after the Tsurphu design.",
        nearby_places: &[
            "Rumtek Dharma Chakra Centre",
            "Old Rumtek Monastery",
            "Lingdum Monastery",
            "Jawaharlal Nehru Botanical Garden",
        ],
        activities: &["prayer hall visit", "monastic debate viewing", "golden stupa darshan"],
        best_time: "March to June, September to December",
    },
    MonasteryRecord {
        name: "Pemayangtse Monastery",
        nearest_town: "Pelling",
        district: "West Sikkim",
        description: "One of the oldest Nyingma monasteries, known for the seven-tiered wooden Zangdok Palri sculpture.",
        nearby_places: &[
            "Rabdentse Ruins",
            "Sangachoeling Monastery",
            "Pelling Skywalk",
            "Khecheopalri Lake",
        ],
        activities: &["Zangdok Palri viewing", "Kanchenjunga sunrise", "heritage walk"],
        best_time: "October to May",
    },
    MonasteryRecord {
        name: "Tashiding Monastery",
        nearest_town: "Yuksom",
        district: "West Sikkim",
        description: "Hilltop monastery between the Rathong and Rangeet rivers, home of the Bumchu water festival.",
        nearby_places: &["Thakthing Chorten", "Dubdi Monastery", "Norbugang Coronation Throne"],
        activities: &["chorten circumambulation", "Bumchu festival", "river valley views"],
        best_time: "February to March, October to December",
    },
    MonasteryRecord {
        name: "Dubdi Monastery",
        nearest_town: "Yuksom",
        district: "West Sikkim",
        description: "Founded in 1701, the oldest monastery in Sikkim, reached by a forest trail above Yuksom.",
        nearby_places: &["Norbugang Coronation Throne", "Kathok Lake", "Yuksom village"],
        activities: &["forest hike", "ancient manuscript viewing", "meditation session"],
        best_time: "March to May, October to November",
    },
    MonasteryRecord {
        name: "Enchey Monastery",
        nearest_town: "Gangtok",
        district: "East Sikkim",
        description: "Two-hundred-year-old monastery above Gangtok, famous for its Chaam masked dance in winter.",
        nearby_places: &["Ganesh Tok", "Hanuman Tok", "MG Marg", "Tashi View Point"],
        activities: &["Chaam dance", "prayer wheel walk", "city panorama"],
        best_time: "December to January, March to May",
    },
    MonasteryRecord {
        name: "Phodong Monastery",
        nearest_town: "Mangan",
        district: "North Sikkim",
        description: "Kagyu monastery with vivid murals, rebuilt in the 18th century on the road to North Sikkim.",
        nearby_places: &["Labrang Monastery", "Tumlong Palace Ruins", "Seven Sisters Waterfall"],
        activities: &["mural viewing", "Losar celebrations", "village walk"],
        best_time: "March to June",
    },
    MonasteryRecord {
        name: "Labrang Monastery",
        nearest_town: "Mangan",
        district: "North Sikkim",
        description: "Small Nyingma monastery built in 1844 to commemorate Lhatsun Chenpo, near Phodong.",
        nearby_places: &["Phodong Monastery", "Tumlong Palace Ruins", "Kabi Lungchok"],
        activities: &["quiet retreat", "butter lamp offering", "hillside photography"],
        best_time: "April to June, October to November",
    },
    MonasteryRecord {
        name: "Ralang Monastery",
        nearest_town: "Ravangla",
        district: "South Sikkim",
        description: "Kagyu monastery near Ravangla hosting the Pang Lhabsol festival and the Kagyed dance.",
        nearby_places: &["Buddha Park of Ravangla", "Ralang Hot Springs", "Borong village", "Temi Tea Garden"],
        activities: &["Kagyed dance", "hot spring visit", "tea garden walk"],
        best_time: "November to December, March to May",
    },
    MonasteryRecord {
        name: "Sanga Choeling Monastery",
        nearest_town: "Pelling",
        district: "West Sikkim",
        description: "Seventeenth-century monastery on a ridge above Pelling, reached by a steep footpath.",
        nearby_places: &["Pemayangtse Monastery", "Rabdentse Ruins", "Rimbi Waterfall"],
        activities: &["ridge trek", "clay statue viewing", "sunset over Kanchenjunga"],
        best_time: "October to April",
    },
    MonasteryRecord {
        name: "Lingdum Monastery",
        nearest_town: "Gangtok",
        district: "East Sikkim",
        description: "Also known as Ranka Monastery, a large modern Kagyu complex with a wide courtyard.",
        nearby_places: &["Rumtek Monastery", "Ranka village", "Banjhakri Falls"],
        activities: &["morning prayers", "courtyard photography", "young monk classes"],
        best_time: "March to June, September to November",
    },
    MonasteryRecord {
        name: "Kartok Monastery",
        nearest_town: "Yuksom",
        district: "West Sikkim",
        description: "Colourful lakeside monastery named after Kartok Rigzin Kuntu Zangpo, one of the founding lamas.",
        nearby_places: &["Kathok Lake", "Dubdi Monastery", "Khangchendzonga National Park gate"],
        activities: &["lakeside meditation", "prayer flag offering", "trailhead visit"],
        best_time: "March to May, October to December",
    },
    MonasteryRecord {
        name: "Tsuklakhang Monastery",
        nearest_town: "Gangtok",
        district: "East Sikkim",
        description: "The former royal chapel of the Chogyals inside the palace grounds, with a rich scripture library.",
        nearby_places: &["Namgyal Institute of Tibetology", "Do Drul Chorten", "MG Marg"],
        activities: &["Losar rituals", "scripture library", "royal chapel tour"],
        best_time: "February to March, October to December",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = monasteries().iter().map(|m| m.name).collect();
        assert_eq!(names.len(), monasteries().len());
    }

    #[test]
    fn every_record_has_places_and_activities() {
        for monastery in monasteries() {
            assert!(!monastery.nearby_places.is_empty(), "{}", monastery.name);
            assert!(!monastery.activities.is_empty(), "{}", monastery.name);
            assert!(!monastery.nearest_town.is_empty(), "{}", monastery.name);
        }
    }

    #[test]
    fn catalog_covers_ten_day_trips() {
        // A 10-day trip visits 9 distinct monasteries.
        assert!(monasteries().len() >= 9);
    }

    #[test]
    fn find_ignores_case() {
        let found = find("rumtek monastery").expect("present");
        assert_eq!(found.nearest_town, "Gangtok");
        assert!(find("Unknown Gompa").is_none());
    }
}
