//! OpenAPI documentation. Served at /api-docs/openapi.json.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use shule_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shule API",
        version = "0.1.0",
        description = "Multi-tenant school management API: schools, admissions, students, and academic content. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Schools
        handlers::schools::create_school,
        handlers::schools::list_schools,
        handlers::schools::get_active_school,
        handlers::schools::get_school,
        handlers::schools::update_admission_config,
        handlers::schools::set_module,
        // Applications
        handlers::applications::list_applications,
        handlers::applications::create_application,
        handlers::applications::get_application,
        handlers::applications::update_application,
        handlers::applications::delete_application,
        handlers::applications::transition_application,
        handlers::applications::assign_admission_number,
        handlers::applications::enroll_application,
        handlers::applications::attach_document,
        handlers::applications::list_documents,
        handlers::applications::backfill_checksum,
        handlers::applications::record_payment,
        handlers::applications::list_payments,
        // Students
        handlers::students::list_students,
        handlers::students::get_student,
        handlers::students::set_student_status,
        // Academics
        handlers::academics::list_curricula,
        handlers::academics::create_curriculum,
        handlers::academics::list_grade_levels,
        handlers::academics::create_grade_level,
        handlers::academics::list_departments,
        handlers::academics::create_department,
        handlers::academics::list_templates,
        handlers::academics::create_template,
        handlers::academics::add_template_grade_level,
        handlers::academics::add_template_department,
        handlers::academics::copy_template,
        // Public
        handlers::public::get_school,
        handlers::public::list_grade_levels,
        handlers::public::school_status,
        handlers::public::create_application,
        handlers::public::get_application,
        handlers::public::update_application,
    ),
    components(schemas(
        error::ErrorResponse,
        models::School,
        models::SchoolStatusCounts,
        models::AdmissionNumberFormat,
        models::Application,
        models::ApplicationStatus,
        models::ApplicationDocument,
        models::ApplicationFeePayment,
        models::Student,
        models::StudentStatus,
        models::Curriculum,
        models::GradeLevel,
        models::Department,
        models::CopyCounts,
        models::CopyReport,
    )),
    tags(
        (name = "schools", description = "School (tenant) management"),
        (name = "applications", description = "Admission applications and workflow"),
        (name = "students", description = "Enrolled students"),
        (name = "academics", description = "Curricula, grade levels, departments, templates"),
        (name = "public", description = "Unauthenticated application flow")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
