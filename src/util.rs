// Front-end helpers.

pub fn format_time(ms: u64) -> String {
    let secs = ms / 1000;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{:01}:{:02}:{:02}", h, m, s)
    } else if m > 0 {
        format!("{:02}:{:02}", m, s)
    } else {
        format!("{}s", s)
    }
}

pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(test)]
mod tests {
    use super::format_time;

    #[test]
    fn formats_elapsed_ms() {
        assert_eq!(format_time(9_400), "9s");
        assert_eq!(format_time(75_000), "01:15");
        assert_eq!(format_time(3_725_000), "1:02:05");
    }
}
