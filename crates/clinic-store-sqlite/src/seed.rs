//! Reference data seeded into every new store, plus the optional demo
//! doctor directory.
//!
//! Ids are fixed so the link tables can refer to them; every insert is
//! `INSERT OR IGNORE`, so seeding an existing store is a no-op.

use rusqlite::{Connection, params};

/// `(id, name, description, doctor_advice, priority)`
const SYMPTOMS: &[(i64, &str, &str, &str, i64)] = &[
  (
    1,
    "headache",
    "Pain or discomfort in the head or face.",
    "Seek immediate help if headache is sudden and severe, accompanied by a stiff neck, \
     confusion, or loss of consciousness.",
    2,
  ),
  (
    2,
    "cough",
    "A reflex action to clear your airways of mucus and irritants.",
    "See a doctor if cough persists for more than 7 days, or is accompanied by blood or \
     difficulty breathing.",
    1,
  ),
  (
    3,
    "acidity",
    "A burning sensation in the chest, also known as heartburn.",
    "Consult a doctor if symptoms occur more than twice a week, or if pain spreads to your \
     arm or jaw.",
    1,
  ),
  (
    4,
    "fever",
    "An increase in body temperature above the normal range (98.6°F / 37°C).",
    "Seek medical attention if fever exceeds 103°F (39.4°C), or lasts longer than 3 days, \
     or is accompanied by severe symptoms.",
    3,
  ),
  (
    5,
    "joint pain",
    "Discomfort, aches, and soreness in any of the body's joints.",
    "Consult a doctor if the joint pain is severe, accompanied by sudden swelling, redness, \
     or if movement is severely limited.",
    2,
  ),
];

/// `(id, name, type label, instructions, disclaimer)`
const RECOMMENDATIONS: &[(i64, &str, &str, &str, Option<&str>)] = &[
  (1, "Ginger Tea", "Home Remedy",
   "Boil fresh ginger slices in water for 10 minutes. Strain and drink warm.",
   Some("Avoid if you have a bleeding disorder.")),
  (2, "Stay Hydrated", "Dietary",
   "Drink at least 8-10 glasses of water throughout the day.",
   None),
  (3, "Paracetamol", "Tablet",
   "Take one 500mg tablet. Do not exceed 4 tablets in 24 hours.",
   Some("Consult a doctor if symptoms persist.")),
  (4, "Honey and Lemon", "Home Remedy",
   "Mix one tablespoon of honey and a few drops of lemon juice in warm water and sip slowly.",
   Some("Do not give honey to children under 1 year old.")),
  (5, "Avipattikar Churna", "Ayurvedic",
   "Take 1-2 teaspoons with lukewarm water before meals.",
   Some("Consult an Ayurvedic practitioner before use.")),
  (6, "Cold Milk", "Dietary",
   "Drink a glass of cold, plain milk to get instant relief from burning sensation.",
   Some("Avoid if you are lactose intolerant.")),
  (7, "Tepid Sponge Bath", "Home Remedy",
   "Wipe the body with lukewarm water for cooling.",
   Some("Avoid ice-cold water, as it can cause shivering.")),
  (8, "Rest and Ice", "Home Remedy",
   "Rest the affected joint and apply a cold pack for 15-20 minutes, 3 times a day.",
   Some("Do not apply ice directly to the skin.")),
  (9, "Naproxen", "Tablet",
   "Take one 250mg tablet every 8 hours.",
   Some("Consult a doctor if you have stomach problems or heart disease.")),
  (10, "Turmeric Milk", "Dietary",
   "Mix 1 teaspoon of turmeric powder in warm milk and drink before bed.",
   None),
];

/// `(id, name, description)`
const SPECIALTIES: &[(i64, &str, &str)] = &[
  (1, "General Physician (GP)", "A doctor who provides routine care and manages common illnesses."),
  (2, "Otolaryngologist (ENT)", "Specializes in the ear, nose, and throat."),
  (3, "Gastroenterologist", "Specializes in the digestive system and its disorders."),
  (4, "Dermatologist", "Specializes in conditions of the skin, hair, and nails."),
  (5, "Orthopedic", "Specializes in bones and joints."),
];

/// `(symptom_id, rec_id)`
const SYMPTOM_RECOMMENDATIONS: &[(i64, i64)] = &[
  (1, 1), (1, 2), (1, 3),
  (2, 1), (2, 4),
  (3, 5), (3, 6),
  (4, 3), (4, 7), (4, 10),
  (5, 8), (5, 9), (5, 10),
];

/// `(symptom_id, specialty_id)`
const SYMPTOM_SPECIALTIES: &[(i64, i64)] = &[
  (1, 1),
  (2, 2), (2, 1),
  (3, 3),
  (4, 1),
  (5, 1), (5, 5),
];

/// `(name, specialty_id, rating, experience, availability, email)`
pub const DEMO_DOCTORS: &[(&str, i64, f64, u32, &str, &str)] = &[
  ("Dr. Priya Sharma", 1, 4.8, 12, "Online/10:00-14:00", "priya@example.com"),
  ("Dr. Anish Menon", 2, 4.5, 8, "Offline/16:00-20:00", "anish@example.com"),
  ("Dr. Sneha Varma", 3, 4.9, 18, "Online/11:00-13:00", "sneha@example.com"),
  ("Dr. Rohit Singh", 1, 4.2, 5, "Offline/17:00-21:00", "rohit@example.com"),
  ("Dr. Kabir Jain", 2, 4.7, 10, "Online/15:00-17:00", "kabir@example.com"),
  ("Dr. Sania Reddy", 5, 4.6, 9, "Offline/09:00-14:00", "sania@example.com"),
];

/// Insert the reference tables. Idempotent.
pub fn seed_reference_data(conn: &mut Connection) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  {
    let mut stmt = tx.prepare(
      "INSERT OR IGNORE INTO symptoms
         (symptom_id, symptom_name, description, doctor_advice, priority)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (id, name, description, advice, priority) in SYMPTOMS {
      stmt.execute(params![id, name, description, advice, priority])?;
    }

    let mut stmt = tx.prepare(
      "INSERT OR IGNORE INTO recommendations
         (rec_id, rec_name, rec_type, instructions, disclaimer)
       VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (id, name, kind, instructions, disclaimer) in RECOMMENDATIONS {
      stmt.execute(params![id, name, kind, instructions, disclaimer])?;
    }

    let mut stmt = tx.prepare(
      "INSERT OR IGNORE INTO specialties (specialty_id, specialty_name, description)
       VALUES (?1, ?2, ?3)",
    )?;
    for (id, name, description) in SPECIALTIES {
      stmt.execute(params![id, name, description])?;
    }

    let mut stmt = tx.prepare(
      "INSERT OR IGNORE INTO symptom_recommendations (symptom_id, rec_id) VALUES (?1, ?2)",
    )?;
    for (symptom_id, rec_id) in SYMPTOM_RECOMMENDATIONS {
      stmt.execute(params![symptom_id, rec_id])?;
    }

    let mut stmt = tx.prepare(
      "INSERT OR IGNORE INTO symptom_specialties (symptom_id, specialty_id) VALUES (?1, ?2)",
    )?;
    for (symptom_id, specialty_id) in SYMPTOM_SPECIALTIES {
      stmt.execute(params![symptom_id, specialty_id])?;
    }
  }
  tx.commit()
}

/// Biography line generated for demo doctors.
pub fn demo_biography(name: &str, specialty: &str, experience: u32, availability: &str) -> String {
  let mode = availability.split('/').next().unwrap_or(availability);
  format!(
    "{name} is a board-certified {specialty} with {experience} years of experience. \
     Available {mode}."
  )
}

pub fn specialty_name(id: i64) -> &'static str {
  SPECIALTIES
    .iter()
    .find(|(sid, _, _)| *sid == id)
    .map(|(_, name, _)| *name)
    .unwrap_or("General Physician (GP)")
}
