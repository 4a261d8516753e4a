use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Projects,
    Instances,
    Storage,
    Usage,
    Capacity,
    Auditing,
}

impl Route {
    pub fn state_name(self) -> &'static str {
        match self {
            Self::Projects => "index.projects",
            Self::Instances => "index.instances",
            Self::Storage => "index.storage",
            Self::Usage => "index.usage",
            Self::Capacity => "index.capacity",
            Self::Auditing => "index.auditing",
        }
    }

    pub fn context(self) -> &'static str {
        match self {
            Self::Projects => "Projects",
            Self::Instances => "Instances",
            Self::Storage => "Storage",
            Self::Usage => "Resource Usage",
            Self::Capacity => "Cloud Capacity by Zone",
            Self::Auditing => "Auditing Events",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_name())
    }
}
