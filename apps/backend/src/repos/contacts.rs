//! Contact repository functions (generic over ConnectionTrait).
//!
//! Every query here is owner-scoped: callers pass the authenticated user's
//! id and rows belonging to other users are invisible, so a foreign id
//! behaves exactly like a missing one.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use time::{Date, Duration, Month, OffsetDateTime};

use crate::entities::contacts;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::http::pagination::{Page, PageParams};

/// Field set shared by create and full update.
#[derive(Debug, Clone)]
pub struct ContactInput {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Option<Date>,
    pub description: Option<String>,
}

/// Optional exact-match filters for the field search endpoints.
#[derive(Debug, Clone, Default)]
pub struct FieldFilters {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl FieldFilters {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
    }
}

fn owned(user_id: i64) -> Condition {
    Condition::all().add(contacts::Column::UserId.eq(user_id))
}

pub async fn list<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    params: &PageParams,
) -> Result<Page<contacts::Model>, AppError> {
    paginate_query(
        conn,
        contacts::Entity::find().filter(owned(user_id)),
        params,
    )
    .await
}

pub async fn get<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    contact_id: i64,
) -> Result<Option<contacts::Model>, AppError> {
    let contact = contacts::Entity::find()
        .filter(owned(user_id).add(contacts::Column::Id.eq(contact_id)))
        .one(conn)
        .await?;
    Ok(contact)
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    input: ContactInput,
) -> Result<contacts::Model, AppError> {
    reject_duplicate(conn, user_id, None, &input).await?;

    let now = OffsetDateTime::now_utc();
    let contact = contacts::ActiveModel {
        user_id: Set(user_id),
        name: Set(input.name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        phone: Set(input.phone),
        birthday: Set(input.birthday),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(contact.insert(conn).await?)
}

pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    contact: contacts::Model,
    input: ContactInput,
) -> Result<contacts::Model, AppError> {
    reject_duplicate(conn, user_id, Some(contact.id), &input).await?;

    let mut active: contacts::ActiveModel = contact.into();
    active.name = Set(input.name);
    active.last_name = Set(input.last_name);
    active.email = Set(input.email);
    active.phone = Set(input.phone);
    active.birthday = Set(input.birthday);
    active.description = Set(input.description);
    active.updated_at = Set(OffsetDateTime::now_utc());
    Ok(active.update(conn).await?)
}

pub async fn rename<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    contact: contacts::Model,
    name: String,
) -> Result<contacts::Model, AppError> {
    let mut active: contacts::ActiveModel = contact.into();
    active.name = Set(name);
    active.updated_at = Set(OffsetDateTime::now_utc());
    Ok(active.update(conn).await?)
}

pub async fn remove<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    contact: contacts::Model,
) -> Result<contacts::Model, AppError> {
    let removed = contact.clone();
    contacts::Entity::delete_by_id(contact.id).exec(conn).await?;
    Ok(removed)
}

/// Another contact of the same owner with the same email, the same phone,
/// or the same (name, last_name) pair counts as a duplicate.
async fn reject_duplicate<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    exclude_id: Option<i64>,
    input: &ContactInput,
) -> Result<(), AppError> {
    let mut condition = owned(user_id).add(
        Condition::any()
            .add(contacts::Column::Email.eq(input.email.as_str()))
            .add(contacts::Column::Phone.eq(input.phone.as_str()))
            .add(
                Condition::all()
                    .add(contacts::Column::Name.eq(input.name.as_str()))
                    .add(contacts::Column::LastName.eq(input.last_name.as_str())),
            ),
    );
    if let Some(id) = exclude_id {
        condition = condition.add(contacts::Column::Id.ne(id));
    }

    let existing = contacts::Entity::find().filter(condition).one(conn).await?;
    if existing.is_some() {
        return Err(AppError::conflict(
            ErrorCode::DuplicateContact,
            "A contact with this email, phone or name already exists",
        ));
    }
    Ok(())
}

/// AND of the provided exact filters; at most one row is returned.
pub async fn search_exact<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    filters: &FieldFilters,
) -> Result<Option<contacts::Model>, AppError> {
    let mut condition = owned(user_id);
    if let Some(name) = &filters.name {
        condition = condition.add(contacts::Column::Name.eq(name.as_str()));
    }
    if let Some(last_name) = &filters.last_name {
        condition = condition.add(contacts::Column::LastName.eq(last_name.as_str()));
    }
    if let Some(email) = &filters.email {
        condition = condition.add(contacts::Column::Email.eq(email.as_str()));
    }
    if let Some(phone) = &filters.phone {
        condition = condition.add(contacts::Column::Phone.eq(phone.as_str()));
    }

    let contact = contacts::Entity::find()
        .filter(condition)
        .order_by_asc(contacts::Column::Name)
        .one(conn)
        .await?;
    Ok(contact)
}

/// Exact OR across name, last name, email and phone.
pub async fn search_any<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    q: &str,
    params: &PageParams,
) -> Result<Page<contacts::Model>, AppError> {
    let condition = owned(user_id).add(
        Condition::any()
            .add(contacts::Column::Name.eq(q))
            .add(contacts::Column::LastName.eq(q))
            .add(contacts::Column::Email.eq(q))
            .add(contacts::Column::Phone.eq(q)),
    );
    paginate_query(conn, contacts::Entity::find().filter(condition), params).await
}

/// Case-insensitive substring OR across the four text fields.
pub async fn search_like_any<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    q: &str,
    params: &PageParams,
) -> Result<Page<contacts::Model>, AppError> {
    let pattern = like_pattern(q);
    let condition = owned(user_id).add(
        Condition::any()
            .add(ci_like(contacts::Column::Name, &pattern))
            .add(ci_like(contacts::Column::LastName, &pattern))
            .add(ci_like(contacts::Column::Email, &pattern))
            .add(ci_like(contacts::Column::Phone, &pattern)),
    );
    paginate_query(conn, contacts::Entity::find().filter(condition), params).await
}

/// Case-insensitive substring AND of the provided field filters.
pub async fn search_like_fields<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    filters: &FieldFilters,
    params: &PageParams,
) -> Result<Page<contacts::Model>, AppError> {
    let mut condition = owned(user_id);
    if let Some(name) = &filters.name {
        condition = condition.add(ci_like(contacts::Column::Name, &like_pattern(name)));
    }
    if let Some(last_name) = &filters.last_name {
        condition = condition.add(ci_like(contacts::Column::LastName, &like_pattern(last_name)));
    }
    if let Some(email) = &filters.email {
        condition = condition.add(ci_like(contacts::Column::Email, &like_pattern(email)));
    }
    if let Some(phone) = &filters.phone {
        condition = condition.add(ci_like(contacts::Column::Phone, &like_pattern(phone)));
    }
    paginate_query(conn, contacts::Entity::find().filter(condition), params).await
}

/// Contacts whose birthday falls within the next `days` days, soonest
/// first. The month-day window is computed here rather than in SQL so the
/// query stays portable between postgres and sqlite.
pub async fn upcoming_birthdays<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    days: i64,
    today: Date,
    params: &PageParams,
) -> Result<Page<contacts::Model>, AppError> {
    let with_birthday = contacts::Entity::find()
        .filter(owned(user_id).add(contacts::Column::Birthday.is_not_null()))
        .order_by_asc(contacts::Column::Name)
        .all(conn)
        .await?;

    let mut upcoming: Vec<(i64, contacts::Model)> = with_birthday
        .into_iter()
        .filter_map(|c| {
            let birthday = c.birthday?;
            let offset = days_until_birthday(birthday, today);
            (offset <= days).then_some((offset, c))
        })
        .collect();
    upcoming.sort_by_key(|(offset, c)| (*offset, c.id));

    let sorted = upcoming.into_iter().map(|(_, c)| c).collect();
    Ok(Page::slice(sorted, params))
}

/// Days from `today` until the next occurrence of `birthday`'s month-day,
/// wrapping across New Year. Feb 29 counts as Mar 1 in non-leap years.
fn days_until_birthday(birthday: Date, today: Date) -> i64 {
    let next = next_occurrence(birthday.month(), birthday.day(), today);
    (next - today).whole_days()
}

fn next_occurrence(month: Month, day: u8, today: Date) -> Date {
    let this_year = calendar_date_or_rollover(today.year(), month, day);
    if this_year >= today {
        this_year
    } else {
        calendar_date_or_rollover(today.year() + 1, month, day)
    }
}

fn calendar_date_or_rollover(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).unwrap_or_else(|_| {
        // Feb 29 in a non-leap year
        Date::from_calendar_date(year, Month::February, 28)
            .map(|d| d + Duration::days(1))
            .unwrap_or(Date::MIN)
    })
}

fn like_pattern(q: &str) -> String {
    format!("%{}%", q.to_lowercase())
}

fn ci_like(column: contacts::Column, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((contacts::Entity, column)))).like(pattern)
}

async fn paginate_query<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    query: sea_orm::Select<contacts::Entity>,
    params: &PageParams,
) -> Result<Page<contacts::Model>, AppError> {
    let paginator = query
        .order_by_asc(contacts::Column::Name)
        .order_by_asc(contacts::Column::Id)
        .paginate(conn, params.size());
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(params.index()).await?;
    Ok(Page::new(items, total, params))
}

#[cfg(test)]
mod tests {
    use time::{Date, Month};

    use super::days_until_birthday;

    fn date(y: i32, m: Month, d: u8) -> Date {
        Date::from_calendar_date(y, m, d).unwrap()
    }

    #[test]
    fn birthday_later_this_year() {
        let today = date(2026, Month::March, 10);
        let birthday = date(1990, Month::March, 15);
        assert_eq!(days_until_birthday(birthday, today), 5);
    }

    #[test]
    fn birthday_today_is_zero() {
        let today = date(2026, Month::March, 10);
        let birthday = date(1985, Month::March, 10);
        assert_eq!(days_until_birthday(birthday, today), 0);
    }

    #[test]
    fn birthday_wraps_into_next_year() {
        let today = date(2026, Month::December, 30);
        let birthday = date(2000, Month::January, 2);
        assert_eq!(days_until_birthday(birthday, today), 3);
    }

    #[test]
    fn feb_29_counts_as_mar_1_in_non_leap_years() {
        let today = date(2026, Month::February, 27);
        let birthday = date(1996, Month::February, 29);
        // 2026 is not a leap year, next occurrence is Mar 1
        assert_eq!(days_until_birthday(birthday, today), 2);
    }

    #[test]
    fn feb_29_kept_in_leap_years() {
        let today = date(2028, Month::February, 27);
        let birthday = date(1996, Month::February, 29);
        assert_eq!(days_until_birthday(birthday, today), 2);
    }
}
