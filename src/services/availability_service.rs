// src/services/availability_service.rs

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        availability_repo::NewSchedule, AvailabilityRepository, BusinessRepository,
        SlotRepository,
    },
    models::scheduling::{BusinessAvailability, NewSlot, RecurringSchedule, Slot},
};

pub type Window = (DateTime<Utc>, DateTime<Utc>);

// Um dia do expediente semanal, como chega do cliente
#[derive(Debug, Clone)]
pub struct DayTemplate {
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub is_closed: bool,
}

#[derive(Debug, Clone)]
pub struct ScheduleInput {
    pub name: String,
    pub days_of_week: Vec<i32>,
    pub start_time: String,
    pub end_time: String,
    pub start_date: String,
    pub end_date: String,
    pub exclude_dates: Vec<String>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    pool: PgPool,
    availability_repo: AvailabilityRepository,
    business_repo: BusinessRepository,
    slot_repo: SlotRepository,
    max_generation_days: i64,
}

impl AvailabilityService {
    pub fn new(
        pool: PgPool,
        availability_repo: AvailabilityRepository,
        business_repo: BusinessRepository,
        slot_repo: SlotRepository,
        max_generation_days: i64,
    ) -> Self {
        Self {
            pool,
            availability_repo,
            business_repo,
            slot_repo,
            max_generation_days,
        }
    }

    // ---
    // Expediente semanal
    // ---

    pub async fn get_weekly(&self, business_id: Uuid) -> Result<Vec<BusinessAvailability>, AppError> {
        self.availability_repo.list_weekly(&self.pool, business_id).await
    }

    /// Grava um ou mais dias (upsert por dia da semana) numa transação só.
    pub async fn set_weekly(
        &self,
        business_id: Uuid,
        days: &[DayTemplate],
    ) -> Result<Vec<BusinessAvailability>, AppError> {
        // Valida tudo antes de abrir a transação
        let mut parsed = Vec::with_capacity(days.len());
        for day in days {
            if !(0..=6).contains(&day.day_of_week) {
                return Err(AppError::BadRequest("invalid_day_of_week"));
            }
            let open = parse_time(&day.start_time)?;
            let close = parse_time(&day.end_time)?;
            if !day.is_closed && close <= open {
                return Err(AppError::BadRequest("invalid_time_window"));
            }
            parsed.push((day.day_of_week, open, close, day.is_closed));
        }

        let mut tx = self.pool.begin().await?;
        for (day_of_week, open, close, is_closed) in parsed {
            self.availability_repo
                .upsert_day(&mut *tx, business_id, day_of_week, open, close, is_closed)
                .await?;
        }
        let week = self.availability_repo.list_weekly(&mut *tx, business_id).await?;
        tx.commit().await?;

        Ok(week)
    }

    // ---
    // Gerador de horários
    // ---

    /// Gera os horários do intervalo [start, end] a partir do expediente semanal.
    /// Datas inválidas são rejeitadas antes de qualquer acesso ao banco.
    #[tracing::instrument(skip(self))]
    pub async fn generate_slots(
        &self,
        business_id: Uuid,
        start_date: &str,
        end_date: &str,
        duration_minutes: Option<i32>,
    ) -> Result<Vec<Slot>, AppError> {
        let (start, end) = parse_range(start_date, end_date, self.max_generation_days)?;
        if matches!(duration_minutes, Some(d) if d <= 0) {
            return Err(AppError::BadRequest("invalid_duration"));
        }

        let business = self
            .business_repo
            .find_by_id(&self.pool, business_id)
            .await?
            .ok_or(AppError::NotFound("business"))?;
        let duration = duration_minutes.unwrap_or(business.slot_duration_min);
        if duration <= 0 {
            return Err(AppError::BadRequest("invalid_duration"));
        }

        let template = self.availability_repo.list_weekly(&self.pool, business_id).await?;
        let windows = plan_weekly(start, end, &template, duration);

        let created = self
            .insert_windows(business_id, &windows, business.max_bookings)
            .await?;
        tracing::info!(count = created.len(), "Horários gerados a partir do expediente");
        Ok(created)
    }

    // ---
    // Agendas recorrentes
    // ---

    pub async fn create_schedule(
        &self,
        business_id: Uuid,
        input: &ScheduleInput,
    ) -> Result<RecurringSchedule, AppError> {
        let mut days = input.days_of_week.clone();
        days.sort_unstable();
        days.dedup();
        if days.is_empty() || days.iter().any(|d| !(0..=6).contains(d)) {
            return Err(AppError::BadRequest("invalid_day_of_week"));
        }

        let start_time = parse_time(&input.start_time)?;
        let end_time = parse_time(&input.end_time)?;
        if end_time <= start_time {
            return Err(AppError::BadRequest("invalid_time_window"));
        }

        let start_date = parse_date(&input.start_date)?;
        let end_date = parse_date(&input.end_date)?;
        if end_date < start_date {
            return Err(AppError::BadRequest("invalid_date_range"));
        }

        let exclude_dates = input
            .exclude_dates
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<_>, _>>()?;

        let new = NewSchedule {
            name: input.name.trim().to_string(),
            days_of_week: days,
            start_time,
            end_time,
            start_date,
            end_date,
            exclude_dates,
        };
        self.availability_repo
            .create_schedule(&self.pool, business_id, &new)
            .await
    }

    pub async fn list_schedules(&self, business_id: Uuid) -> Result<Vec<RecurringSchedule>, AppError> {
        self.availability_repo.list_schedules(business_id).await
    }

    pub async fn delete_schedule(&self, business_id: Uuid, schedule_id: Uuid) -> Result<(), AppError> {
        let deleted = self
            .availability_repo
            .soft_delete_schedule(&self.pool, business_id, schedule_id)
            .await?;
        if !deleted {
            return Err(AppError::NotFound("schedule"));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn generate_from_schedule(
        &self,
        business_id: Uuid,
        schedule_id: Uuid,
        start_date: &str,
        end_date: &str,
        duration_minutes: Option<i32>,
    ) -> Result<Vec<Slot>, AppError> {
        let (start, end) = parse_range(start_date, end_date, self.max_generation_days)?;
        if matches!(duration_minutes, Some(d) if d <= 0) {
            return Err(AppError::BadRequest("invalid_duration"));
        }

        let business = self
            .business_repo
            .find_by_id(&self.pool, business_id)
            .await?
            .ok_or(AppError::NotFound("business"))?;
        let schedule = self
            .availability_repo
            .find_schedule(&self.pool, business_id, schedule_id)
            .await?
            .ok_or(AppError::NotFound("schedule"))?;
        if !schedule.is_active {
            return Err(AppError::BadRequest("schedule_inactive"));
        }

        let duration = duration_minutes.unwrap_or(business.slot_duration_min);
        let windows = plan_schedule(&schedule, start, end, duration);

        let created = self
            .insert_windows(business_id, &windows, business.max_bookings)
            .await?;
        tracing::info!(count = created.len(), "Horários gerados a partir da agenda recorrente");
        Ok(created)
    }

    // Tudo ou nada: uma transação, um INSERT
    async fn insert_windows(
        &self,
        business_id: Uuid,
        windows: &[Window],
        capacity: i32,
    ) -> Result<Vec<Slot>, AppError> {
        let new_slots: Vec<NewSlot> = windows
            .iter()
            .map(|(start_time, end_time)| NewSlot {
                service_id: None,
                start_time: *start_time,
                end_time: *end_time,
                capacity,
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        let created = self
            .slot_repo
            .create_many(&mut *tx, business_id, &new_slots)
            .await?;
        tx.commit().await?;
        Ok(created)
    }
}

// ---
// Funções puras do gerador
// ---

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| AppError::BadRequest("invalid_date"))
}

/// Aceita "HH:MM" e "HH:MM:SS".
pub fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::BadRequest("invalid_time"))
}

/// Intervalo inclusivo, limitado a `max_days` dias.
pub fn parse_range(start: &str, end: &str, max_days: i64) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        return Err(AppError::BadRequest("invalid_date_range"));
    }
    if (end - start).num_days() + 1 > max_days {
        return Err(AppError::BadRequest("date_range_too_long"));
    }
    Ok((start, end))
}

/// 0 = segunda-feira ... 6 = domingo
pub fn day_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_monday() as i16
}

/// Fatia [open, close) em janelas de `duration_min` minutos a partir de `open`.
/// A sobra no fim do dia é descartada (nunca vira um horário mais curto).
pub fn tile_window(date: NaiveDate, open: NaiveTime, close: NaiveTime, duration_min: i32) -> Vec<Window> {
    if duration_min <= 0 || close <= open {
        return Vec::new();
    }

    let step = TimeDelta::minutes(i64::from(duration_min));
    let close_at = date.and_time(close).and_utc();
    let mut cursor = date.and_time(open).and_utc();
    let mut windows = Vec::new();

    // Perto do fim do calendário a soma estoura: para ali
    while let Some(next) = cursor.checked_add_signed(step) {
        if next > close_at {
            break;
        }
        windows.push((cursor, next));
        cursor = next;
    }
    windows
}

pub fn plan_weekly(
    start: NaiveDate,
    end: NaiveDate,
    template: &[BusinessAvailability],
    duration_min: i32,
) -> Vec<Window> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .flat_map(|date| {
            let day = day_index(date);
            match template.iter().find(|t| t.day_of_week == day) {
                Some(t) if !t.is_closed => tile_window(date, t.start_time, t.end_time, duration_min),
                _ => Vec::new(),
            }
        })
        .collect()
}

/// Mesma lógica, mas restrita aos dias da agenda, à sua vigência e sem as datas excluídas.
pub fn plan_schedule(
    schedule: &RecurringSchedule,
    start: NaiveDate,
    end: NaiveDate,
    duration_min: i32,
) -> Vec<Window> {
    let from = start.max(schedule.start_date);
    let until = end.min(schedule.end_date);
    if from > until {
        return Vec::new();
    }

    from.iter_days()
        .take_while(|date| *date <= until)
        .filter(|date| schedule.days_of_week.contains(&i32::from(day_index(*date))))
        .filter(|date| !schedule.exclude_dates.contains(date))
        .flat_map(|date| tile_window(date, schedule.start_time, schedule.end_time, duration_min))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seed_business;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template_day(day_of_week: i16, open: NaiveTime, close: NaiveTime, is_closed: bool) -> BusinessAvailability {
        BusinessAvailability {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            day_of_week,
            start_time: open,
            end_time: close,
            is_closed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn schedule(days: Vec<i32>, from: NaiveDate, until: NaiveDate, exclude: Vec<NaiveDate>) -> RecurringSchedule {
        RecurringSchedule {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            name: "Manhãs".into(),
            days_of_week: days,
            start_time: time(9, 0),
            end_time: time(12, 0),
            start_date: from,
            end_date: until,
            exclude_dates: exclude,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn ninety_minute_slots_drop_the_trailing_remainder() {
        // 09:00-17:00 em blocos de 90 min: 5 horários, o último termina 16:30
        let windows = tile_window(date(2025, 3, 10), time(9, 0), time(17, 0), 90);
        assert_eq!(windows.len(), 5);
        assert_eq!(windows[0].0.time(), time(9, 0));
        assert_eq!(windows[4].0.time(), time(15, 0));
        assert_eq!(windows[4].1.time(), time(16, 30));
    }

    #[test]
    fn slot_ending_exactly_at_close_is_kept() {
        let windows = tile_window(date(2025, 3, 10), time(9, 0), time(17, 0), 60);
        assert_eq!(windows.len(), 8);
        assert_eq!(windows.last().unwrap().1.time(), time(17, 0));
        // Consecutivos e sem buraco
        assert!(windows.windows(2).all(|w| w[0].1 == w[1].0));
    }

    #[test]
    fn empty_or_inverted_windows_yield_nothing() {
        assert!(tile_window(date(2025, 3, 10), time(9, 0), time(9, 0), 30).is_empty());
        assert!(tile_window(date(2025, 3, 10), time(17, 0), time(9, 0), 30).is_empty());
        assert!(tile_window(date(2025, 3, 10), time(9, 0), time(9, 20), 30).is_empty());
        assert!(tile_window(date(2025, 3, 10), time(9, 0), time(17, 0), 0).is_empty());
    }

    #[test]
    fn monday_is_day_zero() {
        assert_eq!(day_index(date(2025, 3, 10)), 0); // segunda
        assert_eq!(day_index(date(2025, 3, 15)), 5); // sábado
        assert_eq!(day_index(date(2025, 3, 16)), 6); // domingo
    }

    #[test]
    fn weekly_plan_skips_missing_and_closed_days() {
        let template = vec![
            template_day(0, time(9, 0), time(11, 0), false), // segunda: 2 horários
            template_day(1, time(9, 0), time(11, 0), true),  // terça: fechado
            template_day(2, time(11, 0), time(9, 0), false), // quarta: fecha antes de abrir
        ];
        // Segunda 10/03 até domingo 16/03
        let windows = plan_weekly(date(2025, 3, 10), date(2025, 3, 16), &template, 60);
        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|(s, _)| s.date_naive() == date(2025, 3, 10)));
    }

    #[test]
    fn schedule_plan_respects_days_range_and_exclusions() {
        // Segundas e quartas, vigente de 05/03 a 19/03, sem 12/03
        let s = schedule(vec![0, 2], date(2025, 3, 5), date(2025, 3, 19), vec![date(2025, 3, 12)]);
        // Pedido maior que a vigência: é cortado pela interseção
        let windows = plan_schedule(&s, date(2025, 3, 1), date(2025, 3, 31), 60);

        let mut days: Vec<NaiveDate> = windows.iter().map(|(s, _)| s.date_naive()).collect();
        days.dedup();
        // 05 (qua), 10 (seg), 17 (seg), 19 (qua). 12 (qua) foi excluído.
        assert_eq!(days, vec![date(2025, 3, 5), date(2025, 3, 10), date(2025, 3, 17), date(2025, 3, 19)]);
        assert_eq!(windows.len(), 4 * 3);
    }

    #[test]
    fn schedule_outside_requested_range_yields_nothing() {
        let s = schedule(vec![0, 1, 2, 3, 4, 5, 6], date(2025, 1, 1), date(2025, 1, 31), vec![]);
        assert!(plan_schedule(&s, date(2025, 2, 1), date(2025, 2, 28), 60).is_empty());
    }

    #[test]
    fn range_parsing_rejects_bad_input() {
        assert!(matches!(parse_range("2025-13-01", "2025-12-31", 366), Err(AppError::BadRequest("invalid_date"))));
        assert!(matches!(parse_range("10/03/2025", "2025-03-11", 366), Err(AppError::BadRequest("invalid_date"))));
        assert!(matches!(parse_range("2025-03-11", "2025-03-10", 366), Err(AppError::BadRequest("invalid_date_range"))));
        assert!(matches!(parse_range("2025-01-01", "2026-06-01", 366), Err(AppError::BadRequest("date_range_too_long"))));

        let (start, end) = parse_range("2025-03-10", "2025-03-10", 366).unwrap();
        assert_eq!(start, end);
    }

    #[test]
    fn time_parsing_accepts_minutes_and_seconds() {
        assert_eq!(parse_time("09:30").unwrap(), time(9, 30));
        assert_eq!(parse_time("17:00:00").unwrap(), time(17, 0));
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn tiling_stops_at_the_end_of_the_calendar() {
        let windows = tile_window(NaiveDate::MAX, time(23, 0), time(23, 59), 30);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].0.time(), time(23, 0));
    }

    // ---
    // Agenda recorrente no banco
    // ---

    fn availability_service(pool: &PgPool) -> AvailabilityService {
        AvailabilityService::new(
            pool.clone(),
            AvailabilityRepository::new(pool.clone()),
            BusinessRepository::new(pool.clone()),
            SlotRepository::new(pool.clone()),
            366,
        )
    }

    fn mornings() -> ScheduleInput {
        ScheduleInput {
            name: "Manhãs".into(),
            days_of_week: vec![2, 0, 0],
            start_time: "09:00".into(),
            end_time: "12:00".into(),
            start_date: "2025-03-05".into(),
            end_date: "2025-03-19".into(),
            exclude_dates: vec!["2025-03-12".into()],
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn schedule_generates_slots_within_its_rules(pool: PgPool) {
        let service = availability_service(&pool);
        let business = seed_business(&pool).await;

        let schedule = service.create_schedule(business.id, &mornings()).await.unwrap();
        assert_eq!(schedule.days_of_week, vec![0, 2]);

        let slots = service
            .generate_from_schedule(business.id, schedule.id, "2025-03-01", "2025-03-31", Some(60))
            .await
            .unwrap();
        assert_eq!(slots.len(), 12);
        assert!(slots.windows(2).all(|w| w[0].start_time < w[1].start_time));
        assert!(slots.iter().all(|s| s.capacity == business.max_bookings && s.service_id.is_none()));
        assert!(slots.iter().all(|s| s.start_time.date_naive() != date(2025, 3, 12)));
        assert_eq!(slots[0].start_time, date(2025, 3, 5).and_time(time(9, 0)).and_utc());

        // Agenda de outro estabelecimento não é visível
        let other = seed_business(&pool).await;
        assert!(matches!(
            service
                .generate_from_schedule(other.id, schedule.id, "2025-03-01", "2025-03-31", None)
                .await,
            Err(AppError::NotFound("schedule"))
        ));

        // Removida: some da lista e não gera mais nada
        service.delete_schedule(business.id, schedule.id).await.unwrap();
        assert!(service.list_schedules(business.id).await.unwrap().is_empty());
        assert!(matches!(
            service
                .generate_from_schedule(business.id, schedule.id, "2025-03-01", "2025-03-31", None)
                .await,
            Err(AppError::NotFound("schedule"))
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn malformed_range_writes_nothing(pool: PgPool) {
        let service = availability_service(&pool);
        let business = seed_business(&pool).await;
        let schedule = service.create_schedule(business.id, &mornings()).await.unwrap();

        assert!(matches!(
            service
                .generate_from_schedule(business.id, schedule.id, "05/03/2025", "2025-03-31", None)
                .await,
            Err(AppError::BadRequest("invalid_date"))
        ));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM slots WHERE business_id = $1")
            .bind(business.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
