use std::time::Duration;

/// Rules from the `User-agent: *` group of a robots.txt file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Robots {
    allows: Vec<String>,
    disallows: Vec<String>,
    crawl_delay: Option<Duration>,
}

impl Robots {
    /// Everything allowed; used when robots.txt is missing or unreachable.
    pub fn allow_all() -> Self { Self::default() }

    pub fn parse(txt: &str) -> Self {
        let mut active = false;
        let mut robots = Robots::default();
        for line in txt.lines() {
            let l = line.split('#').next().unwrap_or("").trim();
            if l.is_empty() { continue; }
            if let Some((k, v)) = l.split_once(':') {
                let key = k.trim().to_lowercase();
                let val = v.trim();
                match key.as_str() {
                    "user-agent" => { active = val == "*"; }
                    "allow" if active && !val.is_empty() => robots.allows.push(val.to_string()),
                    "disallow" if active && !val.is_empty() => robots.disallows.push(val.to_string()),
                    "crawl-delay" if active => {
                        if let Ok(secs) = val.parse::<f64>() {
                            if secs.is_finite() && secs >= 0.0 {
                                robots.crawl_delay = Some(Duration::from_secs_f64(secs));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        robots
    }

    pub fn crawl_delay(&self) -> Option<Duration> { self.crawl_delay }

    /// Longest matching rule wins; an Allow ties with a Disallow of equal length.
    pub fn allows(&self, path: &str) -> bool {
        let longest = |rules: &[String]| rules.iter().filter(|r| path.starts_with(r.as_str())).map(|r| r.len()).max();
        match (longest(&self.allows), longest(&self.disallows)) {
            (Some(a), Some(d)) => a >= d,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}
