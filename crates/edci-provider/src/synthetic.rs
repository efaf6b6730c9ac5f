//! Seeded synthetic feed.
//!
//! Draws every field independently from the ranges the live dashboard feed uses. The generator is
//! owned by the provider and seeded explicitly, so two providers built with the same seed and
//! roster emit identical cycles.

use edci_core::ReadingRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{ProviderResult, ReadingProvider};

/// Taoyuan emergency departments served by the live feed: `(id, display name)`.
pub const DEFAULT_ROSTER: [(&str, &str); 11] = [
    ("linkou-chang-gung", "林口長庚醫院"),
    ("taoyuan-hospital", "部桃園醫院"),
    ("veterans-taoyuan", "榮民醫院桃園分院"),
    ("military-hospital", "國軍醫院"),
    ("st-paul", "聖保祿醫院"),
    ("min-sheng", "敏盛醫院"),
    ("landseed", "聯新醫院"),
    ("tian-sheng", "天晟醫院"),
    ("taoyuan-xinwu", "部桃醫院新屋分院"),
    ("tian-cheng", "天成醫院"),
    ("e-jen", "怡仁醫院"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
}

impl RosterEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    rng: StdRng,
    roster: Vec<RosterEntry>,
    reported_edci: bool,
}

impl SyntheticProvider {
    /// Generator over [`DEFAULT_ROSTER`].
    pub fn new(seed: u64) -> Self {
        let roster = DEFAULT_ROSTER
            .iter()
            .map(|(id, name)| RosterEntry::new(*id, *name))
            .collect();
        Self::with_roster(seed, roster)
    }

    pub fn with_roster(seed: u64, roster: Vec<RosterEntry>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            roster,
            reported_edci: true,
        }
    }

    /// Whether generated records carry an EDCI. When `false` the engine derives it.
    pub fn with_reported_edci(mut self, reported: bool) -> Self {
        self.reported_edci = reported;
        self
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    fn generate(&mut self, entry: &RosterEntry) -> ReadingRecord {
        let rng = &mut self.rng;

        let edci = round_to(rng.gen_range(5.0..30.0), 4);

        let triage_l1 = rng.gen_range(1..=15);
        let triage_l2 = rng.gen_range(10..=49);
        let triage_l3 = rng.gen_range(15..=64);
        let triage_l4 = rng.gen_range(0..=9);
        let triage_l5 = rng.gen_range(0..=4);

        let attending_physicians = rng.gen_range(1..=3);
        let residents = rng.gen_range(1..=3);
        let nurses = rng.gen_range(2..=9);

        let doctor_weighted_patients = f64::from(rng.gen_range(100..=299_u32));
        let effective_doctor_fte = round_to(rng.gen_range(1.0..3.0), 1);
        let nurse_weighted_patients = f64::from(rng.gen_range(50..=199_u32));

        let waiting_for_admission = rng.gen_range(10..=59);
        let over_24_hours = rng.gen_range(0..=7);
        let avg_transfer_time = round_to(rng.gen_range(2.0..10.0), 1);

        ReadingRecord {
            id: entry.id.clone(),
            name: entry.name.clone(),
            triage_l1,
            triage_l2,
            triage_l3,
            triage_l4,
            triage_l5,
            total_patients: Some(triage_l1 + triage_l2 + triage_l3 + triage_l4 + triage_l5),
            attending_physicians,
            residents,
            nurses,
            waiting_for_admission,
            over_24_hours,
            avg_transfer_time,
            doctor_weighted_patients,
            effective_doctor_fte,
            nurse_weighted_patients,
            edci: self.reported_edci.then_some(edci),
        }
    }
}

impl ReadingProvider for SyntheticProvider {
    fn next_cycle(&mut self) -> ProviderResult<Vec<ReadingRecord>> {
        let roster = std::mem::take(&mut self.roster);
        let records = roster.iter().map(|entry| self.generate(entry)).collect();
        self.roster = roster;
        tracing::debug!("generated {} synthetic readings", self.roster.len());
        Ok(records)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}
