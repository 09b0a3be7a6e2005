use crate::model::{
    AssignedIdentity, Member, MemberId, Role, RosterInput, RosterPlan, ShiftBlock, Window,
};
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Import d'un export CSV de sondage de disponibilités.
///
/// Première ligne : cellule vide puis une date `dd/mm/YYYY` par colonne.
/// Les lignes dont la première cellule est vide (créneaux horaires) sont ignorées.
/// Ensuite une ligne par membre : identifiant puis une réponse par date ; `Non` = indisponible.
pub fn import_poll_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<RosterInput> {
    let path = path.as_ref();
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_poll(file).with_context(|| format!("parsing poll {}", path.display()))
}

pub fn parse_poll<R: Read>(reader: R) -> anyhow::Result<RosterInput> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = rdr.records();

    let header = records.next().context("empty poll export")??;
    let dates = header
        .iter()
        .skip(1)
        .map(|field| {
            let field = field.trim();
            if field.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(field, "%d/%m/%Y")
                .map(Some)
                .with_context(|| format!("invalid poll date: {field}"))
        })
        .collect::<anyhow::Result<Vec<Option<NaiveDate>>>>()?;

    let start = dates.iter().flatten().min().copied().context("poll has no date column")?;
    let end = dates.iter().flatten().max().copied().context("poll has no date column")?;
    let window = Window::new(start, end).map_err(anyhow::Error::msg)?;

    let mut members = Vec::new();
    let mut seen = BTreeSet::new();
    for rec in records {
        let rec = rec?;
        let id = rec.get(0).unwrap_or("").trim();
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id.to_string()) {
            bail!("duplicate member in poll: {id}");
        }
        let mut member = Member::new(id);
        for (answer, date) in rec.iter().skip(1).zip(dates.iter()) {
            let Some(date) = date else { continue };
            if is_refusal(answer) {
                member.unavailable.insert(*date);
            }
        }
        members.push(member);
    }

    if members.is_empty() {
        bail!("poll has no member rows");
    }
    RosterInput::new(window, members)
        .map_err(|id| anyhow::anyhow!("duplicate member in poll: {id}"))
}

fn is_refusal(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "non" | "no" | "n" | "0" | "false"
    )
}

/// Charge une liste d'identifiants, un par ligne (`#` = commentaire).
pub fn load_member_list<P: AsRef<Path>>(path: P) -> anyhow::Result<BTreeSet<MemberId>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(MemberId::new)
        .collect())
}

#[derive(Serialize)]
struct Override<'a> {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    user: &'a AssignedIdentity,
}

#[derive(Serialize)]
struct Overrides<'a> {
    overrides: Vec<Override<'a>>,
}

/// Export JSON au format overrides PagerDuty, relève à `handoff` (UTC).
pub fn export_overrides_json<P: AsRef<Path>>(
    path: P,
    blocks: &[ShiftBlock],
    handoff: NaiveTime,
) -> anyhow::Result<()> {
    let overrides = Overrides {
        overrides: blocks
            .iter()
            .map(|b| Override {
                start: at(b.start, handoff),
                end: at(b.end, handoff),
                user: &b.identity,
            })
            .collect(),
    };
    let s = serde_json::to_string_pretty(&overrides)?;
    fs::write(path, s)?;
    Ok(())
}

fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Export JSON du planning (jolie mise en forme)
pub fn export_plan_json<P: AsRef<Path>>(path: P, plan: &RosterPlan) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(plan)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV jour par jour: header `date,weekday,primary,secondary`
pub fn export_plan_csv<P: AsRef<Path>>(path: P, plan: &RosterPlan) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "weekday", "primary", "secondary"])?;
    for day in plan.daily() {
        let date = day.date.to_string();
        let weekday = day.date.format("%A").to_string();
        w.write_record([
            date.as_str(),
            weekday.as_str(),
            day.primary.identity.email.as_str(),
            day.secondary.identity.email.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des compteurs d'équité par membre.
pub fn export_fairness_csv<P: AsRef<Path>>(path: P, plan: &RosterPlan) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "member",
        "primary_shifts",
        "primary_weekends",
        "secondary_shifts",
        "secondary_weekends",
    ])?;

    let ids: BTreeSet<&MemberId> = plan
        .fairness
        .primary
        .shift_count
        .keys()
        .chain(plan.fairness.secondary.shift_count.keys())
        .collect();

    for id in ids {
        let mut buffers = [
            itoa::Buffer::new(),
            itoa::Buffer::new(),
            itoa::Buffer::new(),
            itoa::Buffer::new(),
        ];
        let counts = [
            count(plan, Role::Primary, id, false),
            count(plan, Role::Primary, id, true),
            count(plan, Role::Secondary, id, false),
            count(plan, Role::Secondary, id, true),
        ];
        let [a, b, c, d] = &mut buffers;
        w.write_record([
            id.as_str(),
            a.format(counts[0]),
            b.format(counts[1]),
            c.format(counts[2]),
            d.format(counts[3]),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn count(plan: &RosterPlan, role: Role, id: &MemberId, weekend: bool) -> u32 {
    let counters = plan.fairness.for_role(role);
    let map = if weekend {
        &counters.weekend_shift_count
    } else {
        &counters.shift_count
    };
    map.get(id).copied().unwrap_or(0)
}
