use std::time::Duration;

const DEFAULT_MAX_AUTO_RETRIES: usize = 0;
const DEFAULT_MAX_AUTO_RETRIES_NEXT_SERVER: usize = 1;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_MAX_TOTAL_CONNECTIONS: usize = 200;

/// How an execution unit behaves when the shared admission limit is reached.
///
/// `Queue` waits for a permit inside the remaining aggregate budget;
/// `Reject` fails the attempt immediately with
/// [`RequestError::ConcurrencyLimitRejected`](crate::RequestError::ConcurrencyLimitRejected).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdmissionPolicy {
    #[default]
    Queue,
    Reject,
}

/// Client-tunable knobs for one template family.
///
/// Values default to the system-wide defaults; overrides are applied at
/// template-creation time and are immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    max_auto_retries: usize,
    max_auto_retries_next_server: usize,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_total_connections: usize,
    admission_policy: AdmissionPolicy,
}

impl ClientOptions {
    pub const fn create() -> Self {
        Self {
            max_auto_retries: DEFAULT_MAX_AUTO_RETRIES,
            max_auto_retries_next_server: DEFAULT_MAX_AUTO_RETRIES_NEXT_SERVER,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_total_connections: DEFAULT_MAX_TOTAL_CONNECTIONS,
            admission_policy: AdmissionPolicy::Queue,
        }
    }

    pub const fn with_max_auto_retries(mut self, max_auto_retries: usize) -> Self {
        self.max_auto_retries = max_auto_retries;
        self
    }

    pub const fn with_max_auto_retries_next_server(
        mut self,
        max_auto_retries_next_server: usize,
    ) -> Self {
        self.max_auto_retries_next_server = max_auto_retries_next_server;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_max_total_connections(mut self, max_total_connections: usize) -> Self {
        self.max_total_connections = max_total_connections.max(1);
        self
    }

    pub const fn with_admission_policy(mut self, admission_policy: AdmissionPolicy) -> Self {
        self.admission_policy = admission_policy;
        self
    }

    pub const fn max_auto_retries(&self) -> usize {
        self.max_auto_retries
    }

    pub const fn max_auto_retries_next_server(&self) -> usize {
        self.max_auto_retries_next_server
    }

    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub const fn max_total_connections(&self) -> usize {
        self.max_total_connections
    }

    pub const fn admission_policy(&self) -> AdmissionPolicy {
        self.admission_policy
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::create()
    }
}
