use super::API_V1_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn v1(base: &str, path: &str) -> String {
    base_join(base, &format!("{}/{}", API_V1_PREFIX, path))
}

pub fn health(base: &str) -> String {
    base_join(base, "/heartbeat")
}

pub fn teachers(base: &str) -> String {
    v1(base, "teachers/")
}
pub fn teacher(base: &str, id: i64) -> String {
    v1(base, &format!("teachers/{}", id))
}

pub fn teacher_notes(base: &str) -> String {
    v1(base, "teacher_notes/")
}
/// POST target for a new note of `teacher_id`; PUT target for note `id`.
pub fn teacher_note(base: &str, id: i64) -> String {
    v1(base, &format!("teacher_notes/{}", id))
}
pub fn teacher_notes_by_date(base: &str) -> String {
    v1(base, "teacher_notes/date")
}
pub fn teacher_notes_by_period(base: &str) -> String {
    v1(base, "teacher_notes/period")
}

pub fn kids(base: &str) -> String {
    v1(base, "kids/")
}
pub fn kid(base: &str, id: i64) -> String {
    v1(base, &format!("kids/{}", id))
}

pub fn kid_notes(base: &str) -> String {
    v1(base, "kid_notes/")
}
/// POST target for a new note of `kid_id`; PUT target for note `id`.
pub fn kid_note(base: &str, id: i64) -> String {
    v1(base, &format!("kid_notes/{}", id))
}
pub fn kid_notes_by_period(base: &str) -> String {
    v1(base, "kid_notes/period")
}

pub fn carnets(base: &str) -> String {
    v1(base, "carnets/")
}
/// POST target for a new carnet of `kid_id`; PUT target for carnet `id`.
pub fn carnet(base: &str, id: i64) -> String {
    v1(base, &format!("carnets/{}", id))
}

pub fn monthly_report(base: &str) -> String {
    v1(base, "reports/monthly-report")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slashes() {
        assert_eq!(kids("http://h:1/"), "http://h:1/api/v1/kids/");
        assert_eq!(carnet("http://h:1", 7), "http://h:1/api/v1/carnets/7");
        assert_eq!(monthly_report(""), "/api/v1/reports/monthly-report");
    }
}
