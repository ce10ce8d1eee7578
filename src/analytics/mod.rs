use crate::profile::SessionRecord;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The four per-dimension dashboard metrics on the legacy scale, in the fixed
/// enumeration order used for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Structuring,
    Quantitative,
    Insight,
    Communication,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Structuring,
        Metric::Quantitative,
        Metric::Insight,
        Metric::Communication,
    ];

    pub fn max_score(self) -> u32 {
        match self {
            Metric::Structuring => 30,
            Metric::Quantitative => 15,
            Metric::Insight => 35,
            Metric::Communication => 20,
        }
    }

    pub fn component(self, record: &SessionRecord) -> u32 {
        match self {
            Metric::Structuring => record.structuring,
            Metric::Quantitative => record.quantitative,
            Metric::Insight => record.insight,
            Metric::Communication => record.communication,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Structuring => "Structuring",
            Metric::Quantitative => "Quantitative",
            Metric::Insight => "Insight",
            Metric::Communication => "Communication",
        }
    }
}

/// At most one selected value per dimension; a set filter must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsFilters {
    pub case_type: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    CaseType,
    Difficulty,
}

/// Inclusive date bounds; `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= start);
        let before_end = self.end.map_or(true, |end| date <= end);
        after_start && before_end
    }

    pub fn this_month(today: NaiveDate) -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(today.year(), today.month(), 1),
            end: last_day_of_month(today.year(), today.month()),
        }
    }

    pub fn last_month(today: NaiveDate) -> Self {
        let (year, month) = previous_month(today.year(), today.month());
        Self {
            start: NaiveDate::from_ymd_opt(year, month, 1),
            end: last_day_of_month(year, month),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPercent {
    pub metric: Metric,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupScore {
    pub name: String,
    pub score: u32,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTakeaways {
    pub strength: MetricPercent,
    pub weakness: MetricPercent,
    pub best_type: GroupScore,
    pub worst_type: GroupScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub count: u32,
    pub avg_score: u32,
}

/// Everything the dashboard renders, derived in one pass. Recomputed from
/// scratch on every filter or range change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    /// Rounded mean of total scores; `None` is the "no data" sentinel.
    pub average_score: Option<u32>,
    pub metric_breakdown: Vec<MetricPercent>,
    pub by_type: Vec<GroupScore>,
    pub by_difficulty: Vec<GroupScore>,
    /// Present only with at least two filtered records.
    pub takeaways: Option<KeyTakeaways>,
    /// The filtered records, for the case summary table.
    pub records: Vec<SessionRecord>,
    /// Per-date activity over the FULL history; the calendar ignores filters.
    pub calendar: BTreeMap<NaiveDate, CalendarDay>,
}

/// Effective dashboard score for a record. Records written by the current
/// scorer always carry `total_score`; for older records the legacy component
/// weights coincide with their maxima, so the fallback reduces to a plain
/// component sum.
pub fn weighted_score(record: &SessionRecord) -> u32 {
    if record.total_score > 0 {
        return record.total_score;
    }
    Metric::ALL
        .iter()
        .map(|metric| metric.component(record))
        .sum()
}

/// Pure aggregation of the history under the active filters and date range.
/// Deterministic and side-effect free.
pub fn aggregate(
    history: &[SessionRecord],
    filters: &AnalyticsFilters,
    range: &DateRange,
) -> DashboardView {
    let filtered: Vec<&SessionRecord> = history
        .iter()
        .filter(|record| {
            let type_match = filters
                .case_type
                .as_ref()
                .map_or(true, |value| &record.case_type == value);
            let difficulty_match = filters
                .difficulty
                .as_ref()
                .map_or(true, |value| &record.difficulty == value);
            range.contains(record.date) && type_match && difficulty_match
        })
        .collect();

    let average_score = if filtered.is_empty() {
        None
    } else {
        let sum: u64 = filtered.iter().map(|r| weighted_score(r) as u64).sum();
        Some(((sum as f64) / filtered.len() as f64).round() as u32)
    };

    let metric_breakdown = if filtered.is_empty() {
        Vec::new()
    } else {
        metric_percentages(&filtered)
    };

    let type_groups = grouped_means(&filtered, |record| &record.case_type);
    let difficulty_groups = grouped_means(&filtered, |record| &record.difficulty);
    let takeaways = takeaways(&filtered, &metric_breakdown, &type_groups);

    DashboardView {
        average_score,
        metric_breakdown,
        by_type: sorted_by_score(type_groups),
        by_difficulty: sorted_by_score(difficulty_groups),
        takeaways,
        records: filtered.iter().map(|record| (*record).clone()).collect(),
        calendar: calendar_map(history),
    }
}

fn metric_percentages(records: &[&SessionRecord]) -> Vec<MetricPercent> {
    Metric::ALL
        .iter()
        .map(|metric| {
            let sum: u64 = records
                .iter()
                .map(|record| metric.component(record) as u64)
                .sum();
            let mean = sum as f64 / records.len() as f64;
            MetricPercent {
                metric: *metric,
                percent: ((mean / metric.max_score() as f64) * 100.0).round() as u32,
            }
        })
        .collect()
}

/// Mean score per distinct group value, in first-encountered order.
fn grouped_means<'a>(
    records: &[&'a SessionRecord],
    key: impl Fn(&'a SessionRecord) -> &'a str,
) -> Vec<GroupScore> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, (u64, u32)> = HashMap::new();
    for record in records {
        let name = key(record);
        let entry = sums.entry(name).or_insert_with(|| {
            order.push(name);
            (0, 0)
        });
        entry.0 += weighted_score(record) as u64;
        entry.1 += 1;
    }
    order
        .into_iter()
        .map(|name| {
            let (sum, count) = sums[name];
            GroupScore {
                name: name.to_string(),
                score: (sum as f64 / count as f64).round() as u32,
                count,
            }
        })
        .collect()
}

fn sorted_by_score(mut groups: Vec<GroupScore>) -> Vec<GroupScore> {
    // Stable sort keeps first-encountered order among equal scores.
    groups.sort_by(|a, b| b.score.cmp(&a.score));
    groups
}

fn takeaways(
    records: &[&SessionRecord],
    breakdown: &[MetricPercent],
    type_groups: &[GroupScore],
) -> Option<KeyTakeaways> {
    if records.len() < 2 {
        return None;
    }
    // Ties resolve to the first entry in enumeration order, so a strict
    // comparison replaces max_by_key (which keeps the last maximum).
    let strength = first_extreme(breakdown, |entry| entry.percent, true)?;
    let weakness = first_extreme(breakdown, |entry| entry.percent, false)?;
    let best_type = first_extreme(type_groups, |group| group.score, true)?;
    let worst_type = first_extreme(type_groups, |group| group.score, false)?;
    Some(KeyTakeaways {
        strength,
        weakness,
        best_type,
        worst_type,
    })
}

fn first_extreme<T: Clone>(entries: &[T], key: impl Fn(&T) -> u32, want_max: bool) -> Option<T> {
    let mut best: Option<&T> = None;
    for entry in entries {
        let better = match best {
            None => true,
            Some(current) => {
                if want_max {
                    key(entry) > key(current)
                } else {
                    key(entry) < key(current)
                }
            }
        };
        if better {
            best = Some(entry);
        }
    }
    best.cloned()
}

fn calendar_map(history: &[SessionRecord]) -> BTreeMap<NaiveDate, CalendarDay> {
    let mut sums: BTreeMap<NaiveDate, (u64, u32)> = BTreeMap::new();
    for record in history {
        let entry = sums.entry(record.date).or_insert((0, 0));
        entry.0 += weighted_score(record) as u64;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(date, (sum, count))| {
            (
                date,
                CalendarDay {
                    count,
                    avg_score: (sum as f64 / count as f64).round() as u32,
                },
            )
        })
        .collect()
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|first| first - Duration::days(1))
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Displayed calendar month; navigation is unbounded in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(&mut self) {
        let (year, month) = previous_month(self.year, self.month);
        self.year = year;
        self.month = month;
    }

    pub fn next(&mut self) {
        if self.month == 12 {
            self.year += 1;
            self.month = 1;
        } else {
            self.month += 1;
        }
    }

    /// Month grid cells, Sunday-first: leading `None` padding for the start
    /// weekday, then day-of-month numbers. Empty for an invalid cursor.
    pub fn grid(&self) -> Vec<Option<u32>> {
        let Some(first) = NaiveDate::from_ymd_opt(self.year, self.month, 1) else {
            return Vec::new();
        };
        let Some(last) = last_day_of_month(self.year, self.month) else {
            return Vec::new();
        };
        let leading = first.weekday().num_days_from_sunday() as usize;
        let mut cells: Vec<Option<u32>> = vec![None; leading];
        cells.extend((1..=last.day()).map(Some));
        cells
    }

    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => String::new(),
        }
    }
}

/// Dashboard-local selection state: active filters, date range, and the
/// displayed calendar month. The aggregation itself stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub filters: AnalyticsFilters,
    pub range: DateRange,
    pub month: MonthCursor,
}

impl DashboardState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            filters: AnalyticsFilters::default(),
            range: DateRange::default(),
            month: MonthCursor::from_date(today),
        }
    }

    /// Click-to-filter on a group bar: selecting the already-active value
    /// clears that dimension.
    pub fn toggle_group_filter(&mut self, dimension: GroupDimension, value: &str) {
        let slot = match dimension {
            GroupDimension::CaseType => &mut self.filters.case_type,
            GroupDimension::Difficulty => &mut self.filters.difficulty,
        };
        if slot.as_deref() == Some(value) {
            *slot = None;
        } else {
            *slot = Some(value.to_string());
        }
    }

    pub fn clear_filter(&mut self, dimension: GroupDimension) {
        match dimension {
            GroupDimension::CaseType => self.filters.case_type = None,
            GroupDimension::Difficulty => self.filters.difficulty = None,
        }
    }

    pub fn clear_all_filters(&mut self) {
        self.filters = AnalyticsFilters::default();
    }

    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn view(&self, history: &[SessionRecord]) -> DashboardView {
        aggregate(history, &self.filters, &self.range)
    }
}
