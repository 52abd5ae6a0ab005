use tracing::info;

/// Navigation seam invoked when a due date is tapped.
pub trait DatesRouter: Send + Sync {
    fn open_course_outline(&self, course_id: &str, block_id: &str);
}

/// Router for the headless binary: there is nowhere to navigate to, so the
/// destination is logged.
pub struct LogRouter;

impl DatesRouter for LogRouter {
    fn open_course_outline(&self, course_id: &str, block_id: &str) {
        info!("open course outline: course={} block={}", course_id, block_id);
    }
}
