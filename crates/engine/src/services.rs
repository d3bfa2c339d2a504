use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

#[derive(Clone)]
pub struct ServiceEntry {
    layout_version: u32,
    type_name: &'static str,
    service: Rc<dyn Any>,
}

impl ServiceEntry {
    pub fn layout_version(&self) -> u32 {
        self.layout_version
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.service).downcast::<T>().ok()
    }
}

#[derive(Default)]
pub struct ServiceRegistry {
    entries: HashMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn publish<T: Any>(&mut self, name: &str, layout_version: u32, service: Rc<T>) {
        debug!(
            service = name,
            layout_version,
            type_name = std::any::type_name::<T>(),
            "service_published"
        );
        self.entries.insert(
            name.to_string(),
            ServiceEntry {
                layout_version,
                type_name: std::any::type_name::<T>(),
                service,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&ServiceEntry> {
        self.entries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn lookup_downcasts_to_published_type_only() {
        let mut services = ServiceRegistry::default();
        services.publish("test:counter", 3, Rc::new(RefCell::new(7u32)));

        let entry = services.lookup("test:counter").expect("published");
        assert_eq!(entry.layout_version(), 3);
        let counter = entry.downcast::<RefCell<u32>>().expect("same type");
        assert_eq!(*counter.borrow(), 7);
        assert!(entry.downcast::<RefCell<u64>>().is_none());
    }
}
