//! In-memory store used by the test suite.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::{macros::datetime, Duration, OffsetDateTime};

use crate::athletes::repo::{Athlete, AthleteStore};
use crate::auth::{
    claims::Role,
    password::hash_password,
    repo::{Account, AccountStore, NewAccount, UsernameTaken},
};
use crate::competitions::repo::{Competition, CompetitionInput, CompetitionStore};
use crate::participations::repo::{Participation, ParticipationDetails, ParticipationStore};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    athletes: BTreeMap<i64, Athlete>,
    competitions: BTreeMap<i64, Competition>,
    participations: BTreeMap<i64, Participation>,
    participation_inserts: usize,
    fail_athlete_lookups: bool,
    fail_competition_lookups: bool,
}

fn next_id<V>(map: &BTreeMap<i64, V>) -> i64 {
    map.keys().next_back().map_or(1, |k| k + 1)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Athletes 1..=5 and competitions 1..=3, no accounts.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut t = store.lock();
            let created = datetime!(2024-01-10 09:00 UTC);
            for (i, name) in ["Anna Ivanova", "Boris Petrov", "Carla Diaz", "Dmitri Orlov", "Eva Novak"]
                .into_iter()
                .enumerate()
            {
                let id = i as i64 + 1;
                t.athletes.insert(
                    id,
                    Athlete {
                        id,
                        full_name: name.into(),
                        created_at: created,
                    },
                );
            }
            let first = datetime!(2025-05-01 10:00 UTC);
            for (i, (name, location)) in [
                ("Spring Open", "Kazan"),
                ("National Cup", "Moscow"),
                ("Winter Classic", "Sochi"),
            ]
            .into_iter()
            .enumerate()
            {
                let id = i as i64 + 1;
                t.competitions.insert(
                    id,
                    Competition {
                        id,
                        name: name.into(),
                        location: location.into(),
                        start_date: first + Duration::days(30 * i as i64),
                    },
                );
            }
        }
        store
    }

    pub fn with_account(self, username: &str, password: &str, role: Role) -> Self {
        {
            let mut t = self.lock();
            let id = next_id(&t.accounts);
            t.accounts.insert(
                id,
                Account {
                    id,
                    username: username.into(),
                    email: format!("{username}@example.com"),
                    password_hash: hash_password(password).expect("hash test password"),
                    role,
                    created_at: OffsetDateTime::now_utc(),
                },
            );
        }
        self
    }

    /// Stores an account whose hash cannot be parsed.
    pub fn with_corrupt_account(self, username: &str) -> Self {
        {
            let mut t = self.lock();
            let id = next_id(&t.accounts);
            t.accounts.insert(
                id,
                Account {
                    id,
                    username: username.into(),
                    email: format!("{username}@example.com"),
                    password_hash: "$not-a-phc-string".into(),
                    role: Role::User,
                    created_at: OffsetDateTime::now_utc(),
                },
            );
        }
        self
    }

    pub fn fail_lookups(&self, athletes: bool, competitions: bool) {
        let mut t = self.lock();
        t.fail_athlete_lookups = athletes;
        t.fail_competition_lookups = competitions;
    }

    pub fn participation_inserts(&self) -> usize {
        self.lock().participation_inserts
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn insert(&self, account: NewAccount) -> anyhow::Result<Account> {
        let mut t = self.lock();
        if t.accounts.values().any(|a| a.username == account.username) {
            return Err(UsernameTaken(account.username).into());
        }
        let id = next_id(&t.accounts);
        let stored = Account {
            id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            created_at: OffsetDateTime::now_utc(),
        };
        t.accounts.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl AthleteStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Athlete>> {
        let t = self.lock();
        if t.fail_athlete_lookups {
            anyhow::bail!("athletes table unavailable");
        }
        Ok(t.athletes.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Athlete>> {
        let mut rows: Vec<Athlete> = self.lock().athletes.values().cloned().collect();
        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert(&self, full_name: &str) -> anyhow::Result<Athlete> {
        let mut t = self.lock();
        let id = next_id(&t.athletes);
        let row = Athlete {
            id,
            full_name: full_name.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.athletes.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, full_name: &str) -> anyhow::Result<Option<Athlete>> {
        let mut t = self.lock();
        Ok(t.athletes.get_mut(&id).map(|a| {
            a.full_name = full_name.into();
            a.clone()
        }))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut t = self.lock();
        let removed = t.athletes.remove(&id).is_some();
        if removed {
            t.participations.retain(|_, p| p.athlete_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CompetitionStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Competition>> {
        let t = self.lock();
        if t.fail_competition_lookups {
            anyhow::bail!("competitions table unavailable");
        }
        Ok(t.competitions.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Competition>> {
        let mut rows: Vec<Competition> = self.lock().competitions.values().cloned().collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert(&self, input: CompetitionInput) -> anyhow::Result<Competition> {
        let mut t = self.lock();
        let id = next_id(&t.competitions);
        let row = Competition {
            id,
            name: input.name,
            location: input.location,
            start_date: input.start_date,
        };
        t.competitions.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, input: CompetitionInput) -> anyhow::Result<Option<Competition>> {
        let mut t = self.lock();
        Ok(t.competitions.get_mut(&id).map(|c| {
            c.name = input.name;
            c.location = input.location;
            c.start_date = input.start_date;
            c.clone()
        }))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut t = self.lock();
        let removed = t.competitions.remove(&id).is_some();
        if removed {
            t.participations.retain(|_, p| p.competition_id != id);
        }
        Ok(removed)
    }
}

fn details(t: &Tables, p: &Participation) -> Option<ParticipationDetails> {
    let athlete = t.athletes.get(&p.athlete_id)?;
    let competition = t.competitions.get(&p.competition_id)?;
    Some(ParticipationDetails {
        id: p.id,
        athlete_id: p.athlete_id,
        athlete_full_name: athlete.full_name.clone(),
        competition_id: p.competition_id,
        competition_name: competition.name.clone(),
        place: p.place,
        registered_at: p.registered_at,
    })
}

#[async_trait]
impl ParticipationStore for MemoryStore {
    async fn insert(&self, athlete_id: i64, competition_id: i64) -> anyhow::Result<Participation> {
        let mut t = self.lock();
        let id = next_id(&t.participations);
        let row = Participation {
            id,
            athlete_id,
            competition_id,
            place: None,
            registered_at: OffsetDateTime::now_utc(),
        };
        t.participations.insert(id, row.clone());
        t.participation_inserts += 1;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<ParticipationDetails>> {
        let t = self.lock();
        Ok(t.participations.get(&id).and_then(|p| details(&t, p)))
    }

    async fn list(&self) -> anyhow::Result<Vec<ParticipationDetails>> {
        let t = self.lock();
        let mut rows: Vec<(OffsetDateTime, ParticipationDetails)> = t
            .participations
            .values()
            .filter_map(|p| {
                let start = t.competitions.get(&p.competition_id)?.start_date;
                Some((start, details(&t, p)?))
            })
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then(a.athlete_full_name.cmp(&b.athlete_full_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(rows.into_iter().map(|(_, d)| d).collect())
    }

    async fn update_place(&self, id: i64, place: i32) -> anyhow::Result<bool> {
        let mut t = self.lock();
        Ok(t.participations
            .get_mut(&id)
            .map(|p| p.place = Some(place))
            .is_some())
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.lock().participations.remove(&id).is_some())
    }
}
