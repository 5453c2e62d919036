use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::course::{
    CourseListQuery, CreateCourseRequest, InstructorProfile, UpdateCourseRequest,
};
use crate::utils::slugify;

pub const PAGE_SIZE: i64 = 12;
pub const MAX_LEARNING_POINTS: usize = 15;
const MAX_TITLE_CHARS: usize = 100;
const MAX_SUBTITLE_CHARS: usize = 200;
const PLACEHOLDER_THUMBNAIL: &str = "/uploads/placeholder.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_status")]
pub enum CourseStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_category")]
pub enum Category {
    Development,
    Business,
    Design,
    Marketing,
    #[sqlx(rename = "IT & Software")]
    #[serde(rename = "IT & Software")]
    ItSoftware,
    #[sqlx(rename = "Personal Development")]
    #[serde(rename = "Personal Development")]
    PersonalDevelopment,
    Photography,
    Music,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_level")]
pub enum Level {
    #[default]
    #[sqlx(rename = "All Levels")]
    #[serde(rename = "All Levels")]
    AllLevels,
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    #[default]
    Video,
    Text,
    Quiz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    #[serde(default)]
    pub key: Option<String>,
    pub url: String,
}

impl Default for Thumbnail {
    fn default() -> Self {
        Thumbnail {
            key: None,
            url: PLACEHOLDER_THUMBNAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoVideo {
    #[serde(default)]
    pub key: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub title: String,
    #[serde(rename = "type", default)]
    pub lesson_type: LessonType,
    #[serde(default)]
    pub video_key: Option<String>,
    #[serde(default)]
    pub video_duration: f64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Section {
    pub fn total_duration(&self) -> f64 {
        self.lessons
            .iter()
            .filter(|lesson| lesson.lesson_type == LessonType::Video)
            .map(|lesson| lesson.video_duration)
            .sum()
    }
}

/// The course aggregate. Sections and lessons are owned value types stored
/// in the row's JSONB column, so every write replaces the course as a whole.
#[derive(Debug, Clone, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub category: Category,
    pub level: Level,
    pub language: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub thumbnail: Json<Thumbnail>,
    pub demo_video: Option<Json<DemoVideo>>,
    pub learning_points: Vec<String>,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
    pub sections: Json<Vec<Section>>,
    pub rating: f64,
    pub num_reviews: i32,
    pub students_enrolled: i32,
    pub status: CourseStatus,
    pub instructor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn from_request(req: CreateCourseRequest, instructor_id: Uuid) -> Result<Course, AppError> {
        let now = Utc::now();

        let course = Course {
            id: Uuid::new_v4(),
            slug: slugify(&req.title),
            title: req.title,
            subtitle: req.subtitle.filter(|s| !s.is_empty()),
            description: req.description,
            category: req.category,
            level: req.level.unwrap_or_default(),
            language: req
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "English".to_string()),
            price: req.price,
            discount_price: req.discount_price,
            thumbnail: Json(req.thumbnail.unwrap_or_default()),
            demo_video: req.demo_video.map(Json),
            learning_points: req.learning_points,
            requirements: req.requirements,
            tags: req.tags,
            sections: Json(req.sections),
            rating: 0.0,
            num_reviews: 0,
            students_enrolled: 0,
            status: req.status.unwrap_or_default(),
            instructor_id,
            created_at: now,
            updated_at: now,
        };

        course.validate()?;
        Ok(course)
    }

    /// Selectively overwrites the editable fields. Empty strings count as
    /// "no change"; price applies whenever present, so 0 is a legal update.
    /// A title change regenerates the slug.
    pub fn apply_update(&mut self, req: UpdateCourseRequest) {
        if let Some(title) = req.title.filter(|t| !t.is_empty()) {
            if title != self.title {
                self.slug = slugify(&title);
            }
            self.title = title;
        }
        if let Some(description) = req.description.filter(|d| !d.is_empty()) {
            self.description = description;
        }
        if let Some(price) = req.price {
            self.price = price;
        }
        if let Some(category) = req.category {
            self.category = category;
        }
        if let Some(sections) = req.sections {
            self.sections = Json(sections);
        }
        if let Some(status) = req.status {
            self.status = status;
        }
        if let Some(thumbnail) = req.thumbnail {
            self.thumbnail = Json(thumbnail);
        }
        if let Some(learning_points) = req.learning_points {
            self.learning_points = learning_points;
        }
        if let Some(requirements) = req.requirements {
            self.requirements = requirements;
        }

        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(
                "Title cannot exceed 100 characters".into(),
            ));
        }
        if self.slug.is_empty() {
            return Err(AppError::Validation(
                "Title must contain at least one alphanumeric character".into(),
            ));
        }
        if let Some(subtitle) = &self.subtitle {
            if subtitle.chars().count() > MAX_SUBTITLE_CHARS {
                return Err(AppError::Validation(
                    "Subtitle cannot exceed 200 characters".into(),
                ));
            }
        }
        if self.description.is_empty() {
            return Err(AppError::Validation("Description is required".into()));
        }
        if self.price < 0.0 {
            return Err(AppError::Validation("Price cannot be negative".into()));
        }
        if let Some(discount) = self.discount_price {
            if discount > self.price {
                return Err(AppError::Validation(
                    "Discount price cannot exceed price".into(),
                ));
            }
        }
        if self.learning_points.len() > MAX_LEARNING_POINTS {
            return Err(AppError::Validation(
                "A course can list at most 15 learning points".into(),
            ));
        }

        for section in self.sections.0.iter() {
            if section.title.is_empty() {
                return Err(AppError::Validation("Section title is required".into()));
            }
            for lesson in &section.lessons {
                if lesson.title.is_empty() {
                    return Err(AppError::Validation("Lesson title is required".into()));
                }
                if lesson.lesson_type == LessonType::Video
                    && lesson.video_key.as_deref().unwrap_or("").is_empty()
                {
                    return Err(AppError::Validation(
                        "A video lesson requires a videoKey".into(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Derived, never persisted.
    pub fn total_duration(&self) -> f64 {
        self.sections.0.iter().map(Section::total_duration).sum()
    }
}

// join row: course columns plus the instructor's public fields
#[derive(Debug, FromRow)]
struct CourseWithInstructorRow {
    #[sqlx(flatten)]
    course: Course,
    instructor_name: String,
    instructor_avatar: Option<String>,
    instructor_title: Option<String>,
    instructor_bio: Option<String>,
}

impl CourseWithInstructorRow {
    fn split(self, with_bio: bool) -> (Course, InstructorProfile) {
        let profile = InstructorProfile {
            id: self.course.instructor_id,
            name: self.instructor_name,
            avatar: self.instructor_avatar,
            title: self.instructor_title,
            bio: if with_bio { self.instructor_bio } else { None },
        };
        (self.course, profile)
    }
}

const SELECT_WITH_INSTRUCTOR: &str = "SELECT c.*, \
     u.name AS instructor_name, u.avatar AS instructor_avatar, \
     u.title AS instructor_title, u.bio AS instructor_bio \
     FROM course_table c JOIN user_table u ON u.id = c.instructor_id";

fn conflict_on_duplicate_slug(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict("A course with this title already exists".into())
        }
        _ => AppError::Database(e),
    }
}

pub async fn insert_course(pool: &Pool<Postgres>, course: &Course) -> Result<(), AppError> {
    sqlx::query(
        r#"
            INSERT INTO course_table
                (id, title, slug, subtitle, description, category, level, language,
                 price, discount_price, thumbnail, demo_video, learning_points,
                 requirements, tags, sections, rating, num_reviews, students_enrolled,
                 status, instructor_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
        "#,
    )
    .bind(course.id)
    .bind(&course.title)
    .bind(&course.slug)
    .bind(&course.subtitle)
    .bind(&course.description)
    .bind(course.category)
    .bind(course.level)
    .bind(&course.language)
    .bind(course.price)
    .bind(course.discount_price)
    .bind(&course.thumbnail)
    .bind(&course.demo_video)
    .bind(&course.learning_points)
    .bind(&course.requirements)
    .bind(&course.tags)
    .bind(&course.sections)
    .bind(course.rating)
    .bind(course.num_reviews)
    .bind(course.students_enrolled)
    .bind(course.status)
    .bind(course.instructor_id)
    .bind(course.created_at)
    .bind(course.updated_at)
    .execute(pool)
    .await
    .map_err(conflict_on_duplicate_slug)?;

    Ok(())
}

/// Writes the whole aggregate back in one statement.
pub async fn replace_course(pool: &Pool<Postgres>, course: &Course) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
            UPDATE course_table
            SET title = $2, slug = $3, subtitle = $4, description = $5, category = $6,
                level = $7, language = $8, price = $9, discount_price = $10,
                thumbnail = $11, demo_video = $12, learning_points = $13,
                requirements = $14, tags = $15, sections = $16, rating = $17,
                num_reviews = $18, students_enrolled = $19, status = $20,
                updated_at = $21
            WHERE id = $1
        "#,
    )
    .bind(course.id)
    .bind(&course.title)
    .bind(&course.slug)
    .bind(&course.subtitle)
    .bind(&course.description)
    .bind(course.category)
    .bind(course.level)
    .bind(&course.language)
    .bind(course.price)
    .bind(course.discount_price)
    .bind(&course.thumbnail)
    .bind(&course.demo_video)
    .bind(&course.learning_points)
    .bind(&course.requirements)
    .bind(&course.tags)
    .bind(&course.sections)
    .bind(course.rating)
    .bind(course.num_reviews)
    .bind(course.students_enrolled)
    .bind(course.status)
    .bind(course.updated_at)
    .execute(pool)
    .await
    .map_err(conflict_on_duplicate_slug)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".into()));
    }

    Ok(())
}

pub async fn get_course_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>("SELECT * FROM course_table WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(course)
}

pub async fn get_course_with_instructor(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<(Course, InstructorProfile)>, AppError> {
    let row = sqlx::query_as::<_, CourseWithInstructorRow>(&format!(
        "{} WHERE c.id = $1",
        SELECT_WITH_INSTRUCTOR
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.split(true)))
}

struct ListFilter {
    status: CourseStatus,
    keyword: Option<String>,
    category: Option<String>,
    level: Option<String>,
}

impl ListFilter {
    // "All" disables the category/level filters, empty strings disable any
    fn from_query(query: &CourseListQuery) -> ListFilter {
        let pick = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty() && *v != "All")
                .map(str::to_string)
        };

        ListFilter {
            status: query.status.unwrap_or(CourseStatus::Active),
            keyword: query
                .keyword
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(|k| format!("%{}%", k)),
            category: pick(&query.category),
            level: pick(&query.level),
        }
    }

    fn push_onto(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE c.status = ").push_bind(self.status);
        if let Some(keyword) = &self.keyword {
            qb.push(" AND c.title ILIKE ").push_bind(keyword.clone());
        }
        if let Some(category) = &self.category {
            qb.push(" AND c.category::text = ").push_bind(category.clone());
        }
        if let Some(level) = &self.level {
            qb.push(" AND c.level::text = ").push_bind(level.clone());
        }
    }
}

/// Filtered catalog page with each course's instructor card, plus the total
/// match count for the pagination envelope.
pub async fn list_courses(
    pool: &Pool<Postgres>,
    query: &CourseListQuery,
) -> Result<(Vec<(Course, InstructorProfile)>, i64), AppError> {
    let filter = ListFilter::from_query(query);
    let page = query.page_number.unwrap_or(1).max(1);

    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM course_table c");
    filter.push_onto(&mut count_query);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query = QueryBuilder::<Postgres>::new(SELECT_WITH_INSTRUCTOR);
    filter.push_onto(&mut page_query);
    page_query
        .push(" ORDER BY c.created_at DESC LIMIT ")
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind((page - 1) * PAGE_SIZE);

    let rows = page_query
        .build_query_as::<CourseWithInstructorRow>()
        .fetch_all(pool)
        .await?;

    Ok((rows.into_iter().map(|r| r.split(false)).collect(), total))
}

pub async fn list_courses_by_instructor(
    pool: &Pool<Postgres>,
    instructor_id: Uuid,
    status: Option<CourseStatus>,
) -> Result<Vec<Course>, AppError> {
    let mut qb =
        QueryBuilder::<Postgres>::new("SELECT * FROM course_table c WHERE c.instructor_id = ");
    qb.push_bind(instructor_id);
    if let Some(status) = status {
        qb.push(" AND c.status = ").push_bind(status);
    }
    qb.push(" ORDER BY c.updated_at DESC");

    let courses = qb.build_query_as::<Course>().fetch_all(pool).await?;

    Ok(courses)
}

pub async fn delete_course(pool: &Pool<Postgres>, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM course_table WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Course not found".into()));
    }

    Ok(())
}

/// Probe for a slug collision before writing; the unique index stays as a
/// backstop for the race between probe and write.
pub async fn slug_exists(
    pool: &Pool<Postgres>,
    slug: &str,
    exclude: Option<Uuid>,
) -> Result<bool, AppError> {
    let existing: Option<i32> = sqlx::query_scalar(
        "SELECT 1 FROM course_table WHERE slug = $1 AND ($2::uuid IS NULL OR id != $2)",
    )
    .bind(slug)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;

    Ok(existing.is_some())
}
