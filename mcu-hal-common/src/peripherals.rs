//! Peripheral handles
//!
//! Chip crates describe their register blocks by hand and use
//! [`peripherals!`](crate::peripherals) to generate svd2rust style handles
//! for them: a zero sized type per instance that dereferences to the block
//! at its fixed address, plus a `Peripherals` struct handing every handle
//! out once.
//!
//! ```
//! mod uart {
//!     /// UART registers.
//!     #[repr(C)]
//!     pub struct RegisterBlock {
//!         /// Data register.
//!         pub dr: mcu_hal_common::Reg,
//!     }
//! }
//!
//! mcu_hal_common::peripherals! {
//!     UART0: uart @ 0x4000_0000, "UART 0";
//! }
//!
//! let p = Peripherals::take().unwrap();
//! assert!(Peripherals::take().is_none());
//! assert_eq!(UART0::PTR as usize, UART0_BASE);
//! # let _ = p.UART0;
//! ```

/// Generates peripheral handles and the `Peripherals` singleton.
///
/// Each entry reads `NAME: module @ address, "description";` where `module`
/// holds the instance's `RegisterBlock`.
#[macro_export]
macro_rules! peripherals {
    ($($NAME:ident: $module:ident @ $addr:literal, $doc:literal;)+) => {
        $(
            $crate::paste::paste! {
                #[doc = "Base address of " $doc]
                pub const [<$NAME _BASE>]: usize = $addr;
            }

            #[doc = $doc]
            pub struct $NAME {
                _marker: ::core::marker::PhantomData<*const ()>,
            }

            unsafe impl Send for $NAME {}

            impl $NAME {
                /// Pointer to the register block
                pub const PTR: *const $module::RegisterBlock = $addr as *const _;

                /// Return the pointer to the register block
                #[inline(always)]
                pub const fn ptr() -> *const $module::RegisterBlock {
                    Self::PTR
                }

                /// Steal an instance of this peripheral
                ///
                /// # Safety
                ///
                /// Ensure that the new instance of the peripheral cannot be used in a way
                /// that may race with any existing instances.
                #[inline]
                pub unsafe fn steal() -> Self {
                    Self {
                        _marker: ::core::marker::PhantomData,
                    }
                }
            }

            impl ::core::ops::Deref for $NAME {
                type Target = $module::RegisterBlock;

                #[inline(always)]
                fn deref(&self) -> &Self::Target {
                    unsafe { &*Self::PTR }
                }
            }

            impl core::fmt::Debug for $NAME {
                fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    f.debug_struct(stringify!($NAME)).finish()
                }
            }
        )+

        static TAKEN: $crate::critical_section::Mutex<::core::cell::Cell<bool>> =
            $crate::critical_section::Mutex::new(::core::cell::Cell::new(false));

        /// All the peripherals this crate has drivers for.
        #[allow(non_snake_case)]
        pub struct Peripherals {
            $(
                #[doc = $doc]
                pub $NAME: $NAME,
            )+
        }

        impl Peripherals {
            /// Returns all the peripherals *once*.
            pub fn take() -> Option<Self> {
                $crate::critical_section::with(|cs| {
                    let taken = TAKEN.borrow(cs);
                    if taken.get() {
                        None
                    } else {
                        taken.set(true);
                        Some(Self {
                            $($NAME: unsafe { $NAME::steal() },)+
                        })
                    }
                })
            }

            /// Unchecked version of `Peripherals::take`.
            ///
            /// # Safety
            ///
            /// Each of the returned peripherals must be used at most once.
            pub unsafe fn steal() -> Self {
                $crate::critical_section::with(|cs| TAKEN.borrow(cs).set(true));
                Self {
                    $($NAME: $NAME::steal(),)+
                }
            }
        }
    };
}
