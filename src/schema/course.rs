use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::course::{
    Category, Course, CourseStatus, DemoVideo, Level, Section, Thumbnail,
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub language: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub thumbnail: Option<Thumbnail>,
    pub demo_video: Option<DemoVideo>,
    #[serde(default)]
    pub learning_points: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub status: Option<CourseStatus>,
}

/// Partial update; only these fields are editable after creation.
/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub sections: Option<Vec<Section>>,
    pub status: Option<CourseStatus>,
    pub thumbnail: Option<Thumbnail>,
    pub learning_points: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListQuery {
    pub page_number: Option<i64>,
    pub status: Option<CourseStatus>,
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MyCoursesQuery {
    pub status: Option<CourseStatus>,
}

/// Public projection of the owning instructor. `bio` is only filled in on
/// the single-course view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorProfile {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// The instructor field is either the bare id (create/update/delete
/// responses) or the joined public profile (catalog views).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InstructorRef {
    Id(Uuid),
    Profile(InstructorProfile),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
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
    pub thumbnail: Thumbnail,
    pub demo_video: Option<DemoVideo>,
    pub learning_points: Vec<String>,
    pub requirements: Vec<String>,
    pub tags: Vec<String>,
    pub sections: Vec<Section>,
    pub rating: f64,
    pub num_reviews: i32,
    pub students_enrolled: i32,
    pub status: CourseStatus,
    pub total_duration: f64,
    pub instructor: InstructorRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseResponse {
    pub fn new(course: Course, instructor: Option<InstructorProfile>) -> Self {
        let instructor = match instructor {
            Some(profile) => InstructorRef::Profile(profile),
            None => InstructorRef::Id(course.instructor_id),
        };

        CourseResponse {
            id: course.id,
            title: course.title,
            slug: course.slug,
            subtitle: course.subtitle,
            description: course.description,
            category: course.category,
            level: course.level,
            language: course.language,
            price: course.price,
            discount_price: course.discount_price,
            thumbnail: course.thumbnail.0,
            demo_video: course.demo_video.map(|v| v.0),
            learning_points: course.learning_points,
            requirements: course.requirements,
            tags: course.tags,
            total_duration: course.sections.0.iter().fold(0.0, |acc, section| {
                acc + section.total_duration()
            }),
            sections: course.sections.0,
            rating: course.rating,
            num_reviews: course.num_reviews,
            students_enrolled: course.students_enrolled,
            status: course.status,
            instructor,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web;

    #[test]
    fn list_query_parses_camel_case_params() {
        let query = web::Query::<CourseListQuery>::from_query(
            "pageNumber=3&keyword=rust&category=Development&level=Beginner",
        )
        .unwrap();

        assert_eq!(query.page_number, Some(3));
        assert_eq!(query.keyword.as_deref(), Some("rust"));
        assert_eq!(query.category.as_deref(), Some("Development"));
        assert_eq!(query.level.as_deref(), Some("Beginner"));
        assert!(query.status.is_none());
    }

    #[test]
    fn list_query_defaults_are_all_absent() {
        let query = web::Query::<CourseListQuery>::from_query("").unwrap();
        assert!(query.page_number.is_none());
        assert!(query.status.is_none());
    }

    #[test]
    fn update_request_treats_missing_fields_as_no_change() {
        let req: UpdateCourseRequest = serde_json::from_str(r#"{"price": 0}"#).unwrap();
        assert_eq!(req.price, Some(0.0));
        assert!(req.title.is_none());
        assert!(req.sections.is_none());
    }
}
