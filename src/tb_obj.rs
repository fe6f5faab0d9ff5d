use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

// TbObj lets the user mutably share test objects (monitors, recorded
// waveforms, etc.) between tasks. Since the simulation is single threaded, we
// can use Rc, RefCell, which are not Send + Sync, without worrying.
pub struct TbObj<T>(Rc<RefCell<T>>);

impl<T> TbObj<T> {
    pub fn new(data: T) -> TbObj<T> {
        TbObj(Rc::new(RefCell::new(data)))
    }
    pub fn get(&self) -> Ref<T> {
        (*self.0).borrow()
    }
    pub fn get_mut(&self) -> RefMut<T> {
        (*self.0).borrow_mut()
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.get_mut())
    }
}

impl<T> Clone for TbObj<T> {
    fn clone(&self) -> Self {
        TbObj(self.0.clone())
    }
}

// Rc is neither Send nor Sync but in this context it's safe: tasks only ever
// run on the thread that owns the simulation.
unsafe impl<T> Send for TbObj<T> {}
unsafe impl<T> Sync for TbObj<T> {}
