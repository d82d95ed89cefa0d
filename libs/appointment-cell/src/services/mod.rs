pub mod appointments;
pub mod booking;
pub mod conflict;
pub mod memory;
pub mod notification;
pub mod slots;
pub mod weekday;

pub use appointments::{AppointmentRepository, SupabaseAppointmentRepository};
pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetectionService;
pub use memory::InMemoryBookingStore;
pub use notification::{NotificationReceiver, NotificationSink, StaffNotificationHub};
pub use slots::{SlotRepository, SupabaseSlotRepository};
pub use weekday::resolve_weekday;
