// Observable refs and the change-event protocol
//
// ObservableRef::set -> equality check -> value stored -> ChangeEvent built ->
// every subscriber called in order -> subscribers call on_execute to apply
// and record reversible side effects.

pub mod event;
pub mod reference;
pub mod subscription;

pub use event::ChangeEvent;
pub use reference::ObservableRef;
pub use subscription::Subscription;
